//! Semantic field types

use serde::Serialize;

/// Semantic type of a searchable field, resolved from its declared type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    DateTime,
    /// Declared type the compiler has no rule for
    Unknown,
}

impl FieldKind {
    /// Resolve a declared type name such as `"i64"`, `"Option<String>"` or
    /// `"Nullable(Date)"`. Optional wrappers are peeled off first.
    pub fn from_declared(declared: &str) -> Self {
        let inner = unwrap_optional(declared).to_ascii_lowercase();

        match inner.as_str() {
            "string" | "str" | "&str" | "text" | "varchar" => FieldKind::String,
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "int" | "integer"
            | "smallint" | "bigint" => FieldKind::Integer,
            "f32" | "f64" | "float" | "double" | "real" => FieldKind::Float,
            "decimal" | "numeric" | "bigdecimal" => FieldKind::Decimal,
            "bool" | "boolean" => FieldKind::Boolean,
            "date" | "naivedate" => FieldKind::Date,
            "datetime" | "datetime<utc>" | "naivedatetime" | "timestamp" | "timestamptz" => {
                FieldKind::DateTime
            },
            _ => FieldKind::Unknown,
        }
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, FieldKind::Date | FieldKind::DateTime)
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Decimal => "decimal",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::Unknown => "text",
        };
        f.write_str(name)
    }
}

fn unwrap_optional(declared: &str) -> &str {
    let mut current = declared.trim();

    loop {
        let next = strip_wrapper(current, "Option<", '>')
            .or_else(|| strip_wrapper(current, "Nullable(", ')'))
            .or_else(|| current.strip_suffix('?'))
            .map(str::trim);

        match next {
            Some(inner) => current = inner,
            None => return current,
        }
    }
}

fn strip_wrapper<'a>(s: &'a str, open: &str, close: char) -> Option<&'a str> {
    s.strip_prefix(open)?.strip_suffix(close)
}
