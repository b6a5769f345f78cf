//! Database models
//!
//! One row type per searchable record kind. Column lists come from the
//! kind's [`RecordSchema`](crate::search::RecordSchema), so every struct here
//! mirrors its schema's field declarations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::BigDecimal;
use sqlx::FromRow;

use crate::search::RecordKind;
use crate::tree::{EncodedNode, TaxId, TreeEncoding};

/// A row type that a record kind's search returns
pub trait Record: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static {
    const KIND: RecordKind;
}

/// Taxon node with its tree encoding
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TaxonRow {
    pub tax_id: TaxId,
    pub parent_tax_id: TaxId,
    pub rank: String,
    pub embl_code: Option<String>,
    pub division_id: i32,
    pub inherited_div_flag: bool,
    pub genetic_code_id: i32,
    pub inherited_gc_flag: bool,
    pub mitochondrial_genetic_code_id: i32,
    pub inherited_mgc_flag: bool,
    pub genbank_hidden_flag: bool,
    pub hidden_subtree_root_flag: bool,
    pub comments: Option<String>,
    pub plastid_genetic_code_id: Option<i32>,
    pub inherited_pgc_flag: Option<bool>,
    pub specified_species: Option<bool>,
    pub hydrogenosome_genetic_code_id: Option<i32>,
    pub inherited_hgc_flag: Option<bool>,
    pub sequence_id: i64,
    pub parent_sequence_id: Option<i64>,
    pub depth: i32,
    pub right_bound: i64,
    pub is_leaf: bool,
}

impl TaxonRow {
    pub fn encoding(&self) -> TreeEncoding {
        TreeEncoding {
            sequence_id: self.sequence_id,
            parent_sequence_id: self.parent_sequence_id,
            depth: self.depth,
            right_bound: self.right_bound,
            is_leaf: self.is_leaf,
        }
    }

    pub fn encoded_node(&self) -> EncodedNode {
        EncodedNode {
            tax_id: self.tax_id,
            parent_tax_id: self.parent_tax_id,
            encoding: self.encoding(),
        }
    }
}

impl Record for TaxonRow {
    const KIND: RecordKind = RecordKind::Taxon;
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct NameRow {
    pub id: i64,
    pub tax_id: TaxId,
    pub name_txt: String,
    pub unique_name: Option<String>,
    pub name_class: String,
}

impl Record for NameRow {
    const KIND: RecordKind = RecordKind::Name;
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct LineageRow {
    pub tax_id: TaxId,
    pub tax_name: String,
    pub species: Option<String>,
    pub genus: Option<String>,
    pub family: Option<String>,
    #[sqlx(rename = "order_name")]
    pub order: Option<String>,
    #[sqlx(rename = "class_name")]
    pub class: Option<String>,
    pub phylum: Option<String>,
    pub kingdom: Option<String>,
    pub domain: Option<String>,
}

impl Record for LineageRow {
    const KIND: RecordKind = RecordKind::Lineage;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct MergedRow {
    pub old_tax_id: TaxId,
    pub new_tax_id: TaxId,
}

impl Record for MergedRow {
    const KIND: RecordKind = RecordKind::Merged;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct DeletedRow {
    pub tax_id: TaxId,
}

impl Record for DeletedRow {
    const KIND: RecordKind = RecordKind::Deleted;
}

/// One completed import
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ImportRunRow {
    pub id: i64,
    pub source_version: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub archive_md5: Option<String>,
    pub node_count: i64,
    pub name_count: i64,
    pub lineage_count: i64,
    pub merged_count: i64,
    pub deleted_count: i64,
    #[serde(serialize_with = "decimal_as_string")]
    pub duration_seconds: BigDecimal,
}

/// NUMERIC is written as a decimal string
fn decimal_as_string<S: serde::Serializer>(
    value: &BigDecimal,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl Record for ImportRunRow {
    const KIND: RecordKind = RecordKind::Import;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lineage_serializes_rank_names() {
        let row = LineageRow {
            tax_id: 9606,
            tax_name: "Homo sapiens".to_string(),
            species: None,
            genus: Some("Homo".to_string()),
            family: Some("Hominidae".to_string()),
            order: Some("Primates".to_string()),
            class: Some("Mammalia".to_string()),
            phylum: None,
            kingdom: None,
            domain: Some("Eukaryota".to_string()),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["order"], "Primates");
        assert_eq!(json["class"], "Mammalia");
        assert!(json.get("order_name").is_none());
    }

    #[test]
    fn test_import_duration_is_a_string() {
        let row = ImportRunRow {
            id: 1,
            source_version: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            started_at: "2026-01-16T02:00:00Z".parse().unwrap(),
            finished_at: "2026-01-16T02:04:10Z".parse().unwrap(),
            archive_md5: None,
            node_count: 3,
            name_count: 3,
            lineage_count: 3,
            merged_count: 0,
            deleted_count: 0,
            duration_seconds: "250.125".parse().unwrap(),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["duration_seconds"], "250.125");
        assert_eq!(json["source_version"], "2026-01-15");
    }

    #[test]
    fn test_record_kinds() {
        assert_eq!(TaxonRow::KIND, RecordKind::Taxon);
        assert_eq!(LineageRow::KIND.schema().table, "taxtree_ranked_lineage");
        assert_eq!(ImportRunRow::KIND.schema().order_by, "id");
    }
}
