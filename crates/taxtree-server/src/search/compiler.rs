//! Predicate compiler
//!
//! Operator choice is driven by the field's [`FieldKind`] through a fixed
//! table ([`FieldKind::compiler`]), resolved once when a schema is built:
//!
//! | kind                          | scalar                           | range          |
//! |-------------------------------|----------------------------------|----------------|
//! | string                        | `LIKE` if it has `%`/`*`, else `=` | rejected     |
//! | integer, float, decimal, bool | `=`                              | rejected       |
//! | date, datetime                | `=`                              | `BETWEEN`      |
//! | unknown                       | `column::text =` plus a warning  | lower bound as text, plus a warning |

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::types::BigDecimal;
use std::str::FromStr;

use super::{
    FieldKind, PageRequest, PaginationLimits, RecordSchema, ResolvedField, Scalar, SearchError,
    SearchSpec, SearchValue,
};

pub(crate) type CompileFn = fn(&ResolvedField, &SearchValue) -> Result<PredicateOp, SearchError>;

/// Range separator accepted inside a single text value, e.g. `2024-01-01..2024-06-30`
const RANGE_SEPARATOR: &str = "..";

/// A value coerced to the field's declared type, ready to bind
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateOp {
    Equals(SqlValue),
    /// Equality on the column's text representation
    TextEquals(String),
    /// SQL `LIKE` pattern
    Like(String),
    /// Inclusive on both ends
    Between(SqlValue, SqlValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: &'static str,
    pub column: &'static str,
    pub op: PredicateOp,
}

/// Conjunctive filter plus validated bounds. The bounds apply to the fetch
/// only; counting always covers every match.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSearch {
    pub predicates: Vec<Predicate>,
    pub page: PageRequest,
    pub warnings: Vec<String>,
}

impl FieldKind {
    pub(crate) fn compiler(self) -> CompileFn {
        match self {
            FieldKind::String => compile_string,
            FieldKind::Integer | FieldKind::Float | FieldKind::Decimal | FieldKind::Boolean => {
                compile_equality
            },
            FieldKind::Date | FieldKind::DateTime => compile_temporal,
            FieldKind::Unknown => compile_text_fallback,
        }
    }
}

/// Compile a sparse search request against a record schema.
///
/// Fields the schema does not declare are skipped. Predicates come out in
/// schema order so the generated SQL is stable.
pub fn compile(
    schema: &RecordSchema,
    spec: &SearchSpec,
    limits: &PaginationLimits,
) -> Result<CompiledSearch, SearchError> {
    let page = limits.resolve(spec.limit, spec.offset)?;
    let mut predicates = Vec::new();
    let mut warnings = Vec::new();

    for field in schema.fields() {
        let Some(value) = spec.fields.get(field.name) else {
            continue;
        };

        if field.kind == FieldKind::Unknown {
            tracing::warn!(
                table = schema.table,
                field = field.name,
                declared = field.declared,
                "Unsupported field type, comparing as text"
            );
            warnings.push(format!(
                "Field '{}' has unsupported type '{}'; compared as text",
                field.name, field.declared
            ));
            if let SearchValue::Range(lower, upper) = value {
                warnings.push(format!(
                    "Range '{}..{}' on '{}' is not supported; matched '{}' only",
                    lower, upper, field.name, lower
                ));
            }
        }

        predicates.push(Predicate {
            field: field.name,
            column: field.column,
            op: (field.compile)(field, value)?,
        });
    }

    for name in spec.fields.keys().filter(|name| schema.field(name).is_none()) {
        tracing::debug!(table = schema.table, field = %name, "Ignoring undeclared search field");
    }

    Ok(CompiledSearch {
        predicates,
        page,
        warnings,
    })
}

fn compile_string(field: &ResolvedField, value: &SearchValue) -> Result<PredicateOp, SearchError> {
    let text = scalar_only(field, value)?.to_string();

    if text.contains(['%', '*']) {
        Ok(PredicateOp::Like(text.replace('*', "%")))
    } else {
        Ok(PredicateOp::Equals(SqlValue::Text(text)))
    }
}

fn compile_equality(field: &ResolvedField, value: &SearchValue) -> Result<PredicateOp, SearchError> {
    let scalar = scalar_only(field, value)?;
    Ok(PredicateOp::Equals(coerce(field, scalar)?))
}

fn compile_temporal(field: &ResolvedField, value: &SearchValue) -> Result<PredicateOp, SearchError> {
    let (lower, upper) = match value {
        SearchValue::Range(lower, upper) => (lower.clone(), upper.clone()),
        SearchValue::Scalar(Scalar::Text(text)) => match text.split_once(RANGE_SEPARATOR) {
            Some((lower, upper)) => (
                Scalar::Text(lower.trim().to_string()),
                Scalar::Text(upper.trim().to_string()),
            ),
            None => return Ok(PredicateOp::Equals(coerce(field, &Scalar::Text(text.clone()))?)),
        },
        SearchValue::Scalar(scalar) => return Ok(PredicateOp::Equals(coerce(field, scalar)?)),
    };

    let lower_value = coerce(field, &lower)?;
    let upper_value = coerce(field, &upper)?;

    if is_after(&lower_value, &upper_value) {
        return Err(SearchError::InvertedRange {
            field: field.name.to_string(),
            lower: lower.to_string(),
            upper: upper.to_string(),
        });
    }

    Ok(PredicateOp::Between(lower_value, upper_value))
}

/// Never fails: a range degrades to equality on its lower bound
fn compile_text_fallback(
    _field: &ResolvedField,
    value: &SearchValue,
) -> Result<PredicateOp, SearchError> {
    let scalar = match value {
        SearchValue::Scalar(scalar) | SearchValue::Range(scalar, _) => scalar,
    };
    Ok(PredicateOp::TextEquals(scalar.to_string()))
}

fn scalar_only<'v>(field: &ResolvedField, value: &'v SearchValue) -> Result<&'v Scalar, SearchError> {
    match value {
        SearchValue::Scalar(scalar) => Ok(scalar),
        SearchValue::Range(..) => Err(SearchError::RangeNotSupported {
            field: field.name.to_string(),
        }),
    }
}

fn is_after(lower: &SqlValue, upper: &SqlValue) -> bool {
    match (lower, upper) {
        (SqlValue::Date(l), SqlValue::Date(u)) => l > u,
        (SqlValue::DateTime(l), SqlValue::DateTime(u)) => l > u,
        _ => false,
    }
}

fn coerce(field: &ResolvedField, value: &Scalar) -> Result<SqlValue, SearchError> {
    let invalid = || SearchError::InvalidValue {
        field: field.name.to_string(),
        expected: field.kind,
        value: value.to_string(),
    };

    match (field.kind, value) {
        (FieldKind::String | FieldKind::Unknown, v) => Ok(SqlValue::Text(v.to_string())),

        (FieldKind::Integer, Scalar::Number(n)) => n.as_i64().map(SqlValue::Integer).ok_or_else(invalid),
        (FieldKind::Integer, Scalar::Text(s)) => {
            s.trim().parse().map(SqlValue::Integer).map_err(|_| invalid())
        },

        (FieldKind::Float, Scalar::Number(n)) => n.as_f64().map(SqlValue::Float).ok_or_else(invalid),
        (FieldKind::Float, Scalar::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(SqlValue::Float)
            .ok_or_else(invalid),

        (FieldKind::Decimal, Scalar::Number(n)) => BigDecimal::from_str(&n.to_string())
            .map(SqlValue::Decimal)
            .map_err(|_| invalid()),
        (FieldKind::Decimal, Scalar::Text(s)) => BigDecimal::from_str(s.trim())
            .map(SqlValue::Decimal)
            .map_err(|_| invalid()),

        (FieldKind::Boolean, Scalar::Bool(b)) => Ok(SqlValue::Boolean(*b)),
        (FieldKind::Boolean, Scalar::Text(s)) => parse_bool(s).map(SqlValue::Boolean).ok_or_else(invalid),

        (FieldKind::Date, Scalar::Text(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(SqlValue::Date)
            .map_err(|_| invalid()),
        (FieldKind::DateTime, Scalar::Text(s)) => {
            parse_datetime(s.trim()).map(SqlValue::DateTime).ok_or_else(invalid)
        },

        _ => Err(invalid()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Some(true),
        "false" | "f" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// RFC 3339, a naive timestamp (taken as UTC), or a bare date (midnight UTC)
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
