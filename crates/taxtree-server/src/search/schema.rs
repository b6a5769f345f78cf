//! Declared field types per searchable record kind
//!
//! Each record kind lists its fields once with the type they are declared
//! with. The declared type is resolved to a [`FieldKind`] and a compile
//! function the first time the schema is touched, not per request.

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::compiler::CompileFn;
use super::FieldKind;

/// A field as declared: request name, backing column, declared type name
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub column: &'static str,
    pub declared: &'static str,
}

const fn field(name: &'static str, declared: &'static str) -> FieldDef {
    FieldDef {
        name,
        column: name,
        declared,
    }
}

const fn renamed(name: &'static str, column: &'static str, declared: &'static str) -> FieldDef {
    FieldDef {
        name,
        column,
        declared,
    }
}

#[derive(Clone, Copy)]
pub struct ResolvedField {
    pub name: &'static str,
    pub column: &'static str,
    pub declared: &'static str,
    pub kind: FieldKind,
    pub(crate) compile: CompileFn,
}

impl std::fmt::Debug for ResolvedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedField")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("declared", &self.declared)
            .field("kind", &self.kind)
            .finish()
    }
}

#[derive(Debug)]
pub struct RecordSchema {
    pub table: &'static str,
    /// Stable result order
    pub order_by: &'static str,
    select: String,
    fields: Vec<ResolvedField>,
}

impl RecordSchema {
    pub fn new(table: &'static str, order_by: &'static str, defs: &[FieldDef]) -> Self {
        let fields: Vec<ResolvedField> = defs
            .iter()
            .map(|def| {
                let kind = FieldKind::from_declared(def.declared);
                ResolvedField {
                    name: def.name,
                    column: def.column,
                    declared: def.declared,
                    kind,
                    compile: kind.compiler(),
                }
            })
            .collect();

        let select = fields
            .iter()
            .map(|f| f.column)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            table,
            order_by,
            select,
            fields,
        }
    }

    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column list for `SELECT`, in declaration order
    pub fn select_list(&self) -> &str {
        &self.select
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Taxon,
    Name,
    Lineage,
    Merged,
    Deleted,
    Import,
}

impl RecordKind {
    pub fn schema(self) -> &'static RecordSchema {
        match self {
            RecordKind::Taxon => &TAXON,
            RecordKind::Name => &NAME,
            RecordKind::Lineage => &LINEAGE,
            RecordKind::Merged => &MERGED,
            RecordKind::Deleted => &DELETED,
            RecordKind::Import => &IMPORT,
        }
    }
}

const TAXON_FIELDS: &[FieldDef] = &[
    field("tax_id", "i64"),
    field("parent_tax_id", "i64"),
    field("rank", "String"),
    field("embl_code", "Option<String>"),
    field("division_id", "i32"),
    field("inherited_div_flag", "bool"),
    field("genetic_code_id", "i32"),
    field("inherited_gc_flag", "bool"),
    field("mitochondrial_genetic_code_id", "i32"),
    field("inherited_mgc_flag", "bool"),
    field("genbank_hidden_flag", "bool"),
    field("hidden_subtree_root_flag", "bool"),
    field("comments", "Option<String>"),
    field("plastid_genetic_code_id", "Option<i32>"),
    field("inherited_pgc_flag", "Option<bool>"),
    field("specified_species", "Option<bool>"),
    field("hydrogenosome_genetic_code_id", "Option<i32>"),
    field("inherited_hgc_flag", "Option<bool>"),
    field("sequence_id", "i64"),
    field("parent_sequence_id", "Option<i64>"),
    field("depth", "i32"),
    field("right_bound", "i64"),
    field("is_leaf", "bool"),
];

const NAME_FIELDS: &[FieldDef] = &[
    field("id", "i64"),
    field("tax_id", "i64"),
    field("name_txt", "String"),
    field("unique_name", "Option<String>"),
    // open vocabulary ("scientific name", "synonym", ...), matched as text
    field("name_class", "NameClass"),
];

const LINEAGE_FIELDS: &[FieldDef] = &[
    field("tax_id", "i64"),
    field("tax_name", "String"),
    field("species", "Option<String>"),
    field("genus", "Option<String>"),
    field("family", "Option<String>"),
    renamed("order", "order_name", "Option<String>"),
    renamed("class", "class_name", "Option<String>"),
    field("phylum", "Option<String>"),
    field("kingdom", "Option<String>"),
    field("domain", "Option<String>"),
];

const MERGED_FIELDS: &[FieldDef] = &[field("old_tax_id", "i64"), field("new_tax_id", "i64")];

const DELETED_FIELDS: &[FieldDef] = &[field("tax_id", "i64")];

const IMPORT_FIELDS: &[FieldDef] = &[
    field("id", "i64"),
    field("source_version", "NaiveDate"),
    field("started_at", "DateTime<Utc>"),
    field("finished_at", "DateTime<Utc>"),
    field("archive_md5", "Option<String>"),
    field("node_count", "i64"),
    field("name_count", "i64"),
    field("lineage_count", "i64"),
    field("merged_count", "i64"),
    field("deleted_count", "i64"),
    field("duration_seconds", "Decimal"),
];

static TAXON: LazyLock<RecordSchema> =
    LazyLock::new(|| RecordSchema::new("taxtree_node", "sequence_id", TAXON_FIELDS));
static NAME: LazyLock<RecordSchema> =
    LazyLock::new(|| RecordSchema::new("taxtree_name", "id", NAME_FIELDS));
static LINEAGE: LazyLock<RecordSchema> =
    LazyLock::new(|| RecordSchema::new("taxtree_ranked_lineage", "tax_id", LINEAGE_FIELDS));
static MERGED: LazyLock<RecordSchema> =
    LazyLock::new(|| RecordSchema::new("taxtree_merged_node", "old_tax_id", MERGED_FIELDS));
static DELETED: LazyLock<RecordSchema> =
    LazyLock::new(|| RecordSchema::new("taxtree_deleted_node", "tax_id", DELETED_FIELDS));
static IMPORT: LazyLock<RecordSchema> =
    LazyLock::new(|| RecordSchema::new("taxtree_import", "id", IMPORT_FIELDS));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxon_schema_kinds() {
        let schema = RecordKind::Taxon.schema();
        assert_eq!(schema.table, "taxtree_node");
        assert_eq!(schema.field("rank").unwrap().kind, FieldKind::String);
        assert_eq!(schema.field("plastid_genetic_code_id").unwrap().kind, FieldKind::Integer);
        assert_eq!(schema.field("specified_species").unwrap().kind, FieldKind::Boolean);
        assert!(schema.field("no_such_field").is_none());
    }

    #[test]
    fn test_every_kind_resolves_its_fields() {
        for kind in [
            RecordKind::Taxon,
            RecordKind::Name,
            RecordKind::Lineage,
            RecordKind::Merged,
            RecordKind::Deleted,
            RecordKind::Import,
        ] {
            let schema = kind.schema();
            assert!(!schema.fields().is_empty());
            assert!(schema.field(schema.order_by).is_some(), "{:?}", kind);
        }
    }

    #[test]
    fn test_unknown_declared_type_is_kept() {
        let name_class = RecordKind::Name.schema().field("name_class").unwrap();
        assert_eq!(name_class.kind, FieldKind::Unknown);
        assert_eq!(name_class.declared, "NameClass");
    }

    #[test]
    fn test_import_schema_has_temporal_fields() {
        let schema = RecordKind::Import.schema();
        assert_eq!(schema.field("source_version").unwrap().kind, FieldKind::Date);
        assert_eq!(schema.field("started_at").unwrap().kind, FieldKind::DateTime);
        assert_eq!(schema.field("duration_seconds").unwrap().kind, FieldKind::Decimal);
    }

    #[test]
    fn test_select_list_uses_columns() {
        let select = RecordKind::Lineage.schema().select_list();
        assert!(select.contains("order_name"));
        assert!(select.contains("class_name"));
        assert!(select.starts_with("tax_id, tax_name"));
    }
}
