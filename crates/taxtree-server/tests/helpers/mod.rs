//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use taxtree_server::ingest::ncbi_taxonomy::{
    models::{LineageRecord, NameRecord, NodeRecord},
    DeletedTaxon, MergedTaxon, StorageStats, TaxdumpData, TaxtreeStorage,
};
use taxtree_server::tree::{encode, TaxId};

pub fn node(tax_id: TaxId, parent_tax_id: TaxId, rank: &str) -> NodeRecord {
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

pub fn name(tax_id: TaxId, name_txt: &str, name_class: &str) -> NameRecord {
    NameRecord {
        tax_id,
        name_txt: name_txt.to_string(),
        unique_name: None,
        name_class: name_class.to_string(),
    }
}

fn lineage(tax_id: TaxId, tax_name: &str, genus: Option<&str>) -> LineageRecord {
    LineageRecord {
        tax_id,
        tax_name: tax_name.to_string(),
        species: None,
        genus: genus.map(str::to_string),
        family: Some("Hominidae".to_string()),
        order: Some("Primates".to_string()),
        class: Some("Mammalia".to_string()),
        phylum: Some("Chordata".to_string()),
        kingdom: Some("Metazoa".to_string()),
        domain: Some("Eukaryota".to_string()),
    }
}

/// The five-node tree `1<-1, 2<-1, 3<-1, 4<-2, 5<-2`
///
/// Preorder is 1, 2, 4, 5, 3. Id 12 was merged into 4 and id 99 deleted.
pub fn sample_data() -> TaxdumpData {
    TaxdumpData {
        nodes: vec![
            node(1, 1, "no rank"),
            node(2, 1, "genus"),
            node(3, 1, "genus"),
            node(4, 2, "species"),
            node(5, 2, "species"),
        ],
        names: vec![
            name(1, "root", "scientific name"),
            name(2, "Homo", "scientific name"),
            name(4, "Homo sapiens", "scientific name"),
            name(4, "human", "genbank common name"),
            name(5, "Homo neanderthalensis", "scientific name"),
            name(3, "Pan", "scientific name"),
        ],
        lineages: vec![
            lineage(4, "Homo sapiens", Some("Homo")),
            lineage(5, "Homo neanderthalensis", Some("Homo")),
        ],
        merged: vec![MergedTaxon::new(12, 4)],
        deleted: vec![DeletedTaxon::new(99)],
        source_version: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        archive_md5: Some("0123456789abcdef0123456789abcdef".to_string()),
    }
}

pub async fn load_sample(pool: &PgPool) -> StorageStats {
    let data = sample_data();
    let tree = encode(&data.edges()).unwrap();
    TaxtreeStorage::new(pool.clone())
        .replace_all(&data, &tree, Utc::now())
        .await
        .unwrap()
}
