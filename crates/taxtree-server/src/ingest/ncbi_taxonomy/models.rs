//! Records parsed from the taxdump files

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::tree::{Edge, TaxId};

/// One line of `nodes.dmp`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub tax_id: TaxId,
    /// Equal to `tax_id` for the root only
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
}

impl NodeRecord {
    pub fn edge(&self) -> Edge {
        Edge::new(self.tax_id, self.parent_tax_id)
    }
}

/// One line of `names.dmp`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NameRecord {
    pub tax_id: TaxId,
    pub name_txt: String,
    pub unique_name: Option<String>,
    /// e.g. "scientific name", "synonym", "authority"
    pub name_class: String,
}

/// One line of `rankedlineage.dmp`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineageRecord {
    pub tax_id: TaxId,
    pub tax_name: String,
    pub species: Option<String>,
    pub genus: Option<String>,
    pub family: Option<String>,
    pub order: Option<String>,
    pub class: Option<String>,
    pub phylum: Option<String>,
    pub kingdom: Option<String>,
    /// Called "superkingdom" in older dumps
    pub domain: Option<String>,
}

/// A retired id folded into another (`merged.dmp`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergedTaxon {
    pub old_tax_id: TaxId,
    pub new_tax_id: TaxId,
}

impl MergedTaxon {
    pub fn new(old_tax_id: TaxId, new_tax_id: TaxId) -> Self {
        Self {
            old_tax_id,
            new_tax_id,
        }
    }
}

/// A retired id with no successor (`delnodes.dmp`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletedTaxon {
    pub tax_id: TaxId,
}

impl DeletedTaxon {
    pub fn new(tax_id: TaxId) -> Self {
        Self { tax_id }
    }
}

/// Everything one import loads
#[derive(Debug, Clone)]
pub struct TaxdumpData {
    pub nodes: Vec<NodeRecord>,
    pub names: Vec<NameRecord>,
    pub lineages: Vec<LineageRecord>,
    pub merged: Vec<MergedTaxon>,
    pub deleted: Vec<DeletedTaxon>,
    /// Date of the dump
    pub source_version: NaiveDate,
    /// MD5 of the archive, when known
    pub archive_md5: Option<String>,
}

impl TaxdumpData {
    pub fn edges(&self) -> Vec<Edge> {
        self.nodes.iter().map(NodeRecord::edge).collect()
    }

    pub fn stats(&self) -> TaxdumpStats {
        TaxdumpStats {
            nodes: self.nodes.len(),
            names: self.names.len(),
            lineages: self.lineages.len(),
            merged: self.merged.len(),
            deleted: self.deleted.len(),
            source_version: self.source_version,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxdumpStats {
    pub nodes: usize,
    pub names: usize,
    pub lineages: usize,
    pub merged: usize,
    pub deleted: usize,
    pub source_version: NaiveDate,
}

impl std::fmt::Display for TaxdumpStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes, {} names, {} lineages, {} merged, {} deleted (version {})",
            self.nodes, self.names, self.lineages, self.merged, self.deleted, self.source_version
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn node(tax_id: TaxId, parent_tax_id: TaxId, rank: &str) -> NodeRecord {
        NodeRecord {
            tax_id,
            parent_tax_id,
            rank: rank.to_string(),
            embl_code: None,
            division_id: 0,
            inherited_div_flag: false,
            genetic_code_id: 1,
            inherited_gc_flag: false,
            mitochondrial_genetic_code_id: 0,
            inherited_mgc_flag: false,
            genbank_hidden_flag: false,
            hidden_subtree_root_flag: false,
            comments: None,
            plastid_genetic_code_id: None,
            inherited_pgc_flag: None,
            specified_species: None,
            hydrogenosome_genetic_code_id: None,
            inherited_hgc_flag: None,
        }
    }

    #[test]
    fn test_edges_follow_node_order() {
        let data = TaxdumpData {
            nodes: vec![node(1, 1, "no rank"), node(2, 1, "domain"), node(9, 2, "phylum")],
            names: vec![],
            lineages: vec![],
            merged: vec![MergedTaxon::new(12, 9)],
            deleted: vec![DeletedTaxon::new(42)],
            source_version: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            archive_md5: None,
        };

        let edges = data.edges();
        assert_eq!(edges.len(), 3);
        assert!(edges[0].is_root());
        assert_eq!(edges[2], Edge::new(9, 2));

        let stats = data.stats();
        assert_eq!(stats.nodes, 3);
        assert_eq!(stats.merged, 1);
        assert_eq!(
            stats.to_string(),
            "3 nodes, 0 names, 0 lineages, 1 merged, 1 deleted (version 2026-01-15)"
        );
    }
}
