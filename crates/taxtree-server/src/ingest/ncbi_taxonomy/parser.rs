//! NCBI Taxonomy taxdump parser
//!
//! Parses the `.dmp` files of a `new_taxdump` archive:
//! - nodes.dmp: one line per taxon with its parent and classification flags
//! - names.dmp: names of every taxon
//! - rankedlineage.dmp: lineage names per rank
//! - merged.dmp: merged taxonomy ids (old → new)
//! - delnodes.dmp: deleted taxonomy ids
//!
//! # File Format
//! Fields are separated by `\t|\t` and lines end with `\t|`.
//! A malformed line rejects the whole dump, as do names or lineages that
//! refer to a taxon missing from nodes.dmp. Dropping either would lose a
//! taxon without the encoder noticing.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

use super::ftp::TaxdumpFiles;
use super::models::{
    DeletedTaxon, LineageRecord, MergedTaxon, NameRecord, NodeRecord, TaxdumpData,
};
use crate::tree::TaxId;

const FIELD_SEPARATOR: &str = "\t|\t";
const LINE_TERMINATOR: &str = "\t|";

/// Columns of `nodes.dmp` before the optional genetic-code columns were added
const NODE_REQUIRED_FIELDS: usize = 13;
const LINEAGE_MIN_FIELDS: usize = 10;

/// Parser for NCBI Taxonomy taxdump files
pub struct TaxdumpParser {
    /// Maximum number of node records to keep (None for unlimited)
    parse_limit: Option<usize>,
}

impl TaxdumpParser {
    pub fn new() -> Self {
        Self { parse_limit: None }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            parse_limit: Some(limit),
        }
    }

    /// Parse every file of a dump.
    ///
    /// With a parse limit, names and lineages are restricted to the kept
    /// nodes so the result can still be stored.
    pub fn parse(
        &self,
        files: &TaxdumpFiles,
        source_version: NaiveDate,
        archive_md5: Option<String>,
    ) -> Result<TaxdumpData> {
        debug!("Parsing nodes.dmp");
        let nodes = self.parse_nodes(&files.nodes)?;
        debug!("Parsed {} nodes", nodes.len());

        if nodes.is_empty() {
            anyhow::bail!("nodes.dmp contains no records");
        }

        debug!("Parsing names.dmp");
        let mut names = parse_lines(&files.names, "names.dmp", parse_name_line)?;
        debug!("Parsing rankedlineage.dmp");
        let mut lineages =
            parse_lines(&files.rankedlineage, "rankedlineage.dmp", parse_lineage_line)?;

        let kept: HashSet<TaxId> = nodes.iter().map(|n| n.tax_id).collect();
        if self.parse_limit.is_some() {
            names.retain(|n| kept.contains(&n.tax_id));
            lineages.retain(|l| kept.contains(&l.tax_id));
        }
        check_references("names.dmp", names.iter().map(|n| n.tax_id), &kept)?;
        check_references("rankedlineage.dmp", lineages.iter().map(|l| l.tax_id), &kept)?;
        debug!("Parsed {} names, {} lineages", names.len(), lineages.len());

        let merged = parse_lines(&files.merged, "merged.dmp", parse_merged_line)?;
        let deleted = parse_lines(&files.delnodes, "delnodes.dmp", parse_delnodes_line)?;
        debug!("Parsed {} merged, {} deleted", merged.len(), deleted.len());

        Ok(TaxdumpData {
            nodes,
            names,
            lineages,
            merged,
            deleted,
            source_version,
            archive_md5,
        })
    }

    pub fn parse_nodes(&self, content: &str) -> Result<Vec<NodeRecord>> {
        let mut nodes = parse_lines(content, "nodes.dmp", parse_node_line)?;
        if let Some(limit) = self.parse_limit {
            if nodes.len() > limit {
                debug!("Reached parse limit of {} nodes", limit);
                nodes.truncate(limit);
            }
        }
        Ok(nodes)
    }
}

impl Default for TaxdumpParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse every non-empty line; the first malformed one fails the file
fn parse_lines<T>(content: &str, file: &str, parse: fn(&str) -> Result<T>) -> Result<Vec<T>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse(line).with_context(|| format!("Malformed {} line {}", file, index + 1))
        })
        .collect()
}

/// Every referenced taxon must be one of the parsed nodes
fn check_references(
    file: &str,
    tax_ids: impl Iterator<Item = TaxId>,
    nodes: &HashSet<TaxId>,
) -> Result<()> {
    let mut unknown: Vec<TaxId> = tax_ids.filter(|id| !nodes.contains(id)).collect();
    if unknown.is_empty() {
        return Ok(());
    }

    unknown.sort_unstable();
    unknown.dedup();
    anyhow::bail!(
        "{} references {} taxa missing from nodes.dmp (first: {})",
        file,
        unknown.len(),
        unknown[0]
    )
}

/// Split a dump line into its fields, dropping the line terminator
pub fn split_fields(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let line = line.strip_suffix(LINE_TERMINATOR).unwrap_or(line);
    line.split(FIELD_SEPARATOR).map(str::trim).collect()
}

fn expect_fields<'a>(line: &'a str, min: usize) -> Result<Vec<&'a str>> {
    let fields = split_fields(line);
    if fields.len() < min {
        anyhow::bail!("Expected at least {} fields, got {}", min, fields.len());
    }
    Ok(fields)
}

fn tax_id(field: &str, what: &str) -> Result<TaxId> {
    field
        .parse()
        .with_context(|| format!("Invalid {}: '{}'", what, field))
}

fn integer(field: &str, what: &str) -> Result<i32> {
    field
        .parse()
        .with_context(|| format!("Invalid {}: '{}'", what, field))
}

fn flag(field: &str, what: &str) -> Result<bool> {
    match field {
        "1" => Ok(true),
        "0" => Ok(false),
        other => anyhow::bail!("Invalid {} flag: '{}'", what, other),
    }
}

fn text(field: &str) -> Option<String> {
    (!field.is_empty()).then(|| field.to_string())
}

fn optional<T>(fields: &[&str], index: usize, parse: impl Fn(&str) -> Result<T>) -> Result<Option<T>> {
    match fields.get(index) {
        Some(field) if !field.is_empty() => parse(field).map(Some),
        _ => Ok(None),
    }
}

/// Parse a line of nodes.dmp
///
/// ```text
/// tax_id | parent tax_id | rank | embl code | division id | inherited div flag |
/// genetic code id | inherited GC flag | mitochondrial genetic code id |
/// inherited MGC flag | GenBank hidden flag | hidden subtree root flag | comments |
/// plastid genetic code id | inherited PGC flag | specified_species |
/// hydrogenosome genetic code id | inherited HGC flag |
/// ```
pub fn parse_node_line(line: &str) -> Result<NodeRecord> {
    let f = expect_fields(line, NODE_REQUIRED_FIELDS)?;

    Ok(NodeRecord {
        tax_id: tax_id(f[0], "tax_id")?,
        parent_tax_id: tax_id(f[1], "parent tax_id")?,
        rank: f[2].to_string(),
        embl_code: text(f[3]),
        division_id: integer(f[4], "division id")?,
        inherited_div_flag: flag(f[5], "inherited div")?,
        genetic_code_id: integer(f[6], "genetic code id")?,
        inherited_gc_flag: flag(f[7], "inherited GC")?,
        mitochondrial_genetic_code_id: integer(f[8], "mitochondrial genetic code id")?,
        inherited_mgc_flag: flag(f[9], "inherited MGC")?,
        genbank_hidden_flag: flag(f[10], "GenBank hidden")?,
        hidden_subtree_root_flag: flag(f[11], "hidden subtree root")?,
        comments: text(f[12]),
        plastid_genetic_code_id: optional(&f, 13, |s| integer(s, "plastid genetic code id"))?,
        inherited_pgc_flag: optional(&f, 14, |s| flag(s, "inherited PGC"))?,
        specified_species: optional(&f, 15, |s| flag(s, "specified species"))?,
        hydrogenosome_genetic_code_id: optional(&f, 16, |s| {
            integer(s, "hydrogenosome genetic code id")
        })?,
        inherited_hgc_flag: optional(&f, 17, |s| flag(s, "inherited HGC"))?,
    })
}

/// Parse a line of names.dmp
///
/// ```text
/// tax_id | name_txt | unique name | name class |
/// ```
pub fn parse_name_line(line: &str) -> Result<NameRecord> {
    let f = expect_fields(line, 4)?;
    if f[1].is_empty() {
        anyhow::bail!("Empty name_txt");
    }

    Ok(NameRecord {
        tax_id: tax_id(f[0], "tax_id")?,
        name_txt: f[1].to_string(),
        unique_name: text(f[2]),
        name_class: f[3].to_string(),
    })
}

/// Parse a line of rankedlineage.dmp
///
/// ```text
/// tax_id | tax_name | species | genus | family | order | class | phylum | kingdom | [realm |] domain |
/// ```
///
/// The last column is the top rank, called "superkingdom" in older dumps
/// and "domain" in newer ones.
pub fn parse_lineage_line(line: &str) -> Result<LineageRecord> {
    let f = expect_fields(line, LINEAGE_MIN_FIELDS)?;
    let last = f.len() - 1;

    Ok(LineageRecord {
        tax_id: tax_id(f[0], "tax_id")?,
        tax_name: f[1].to_string(),
        species: text(f[2]),
        genus: text(f[3]),
        family: text(f[4]),
        order: text(f[5]),
        class: text(f[6]),
        phylum: text(f[7]),
        kingdom: text(f[8]),
        domain: text(f[last]),
    })
}

/// Parse a line of merged.dmp
///
/// ```text
/// old_tax_id | new_tax_id |
/// ```
pub fn parse_merged_line(line: &str) -> Result<MergedTaxon> {
    let f = expect_fields(line, 2)?;
    Ok(MergedTaxon::new(tax_id(f[0], "old tax_id")?, tax_id(f[1], "new tax_id")?))
}

/// Parse a line of delnodes.dmp
///
/// ```text
/// tax_id |
/// ```
pub fn parse_delnodes_line(line: &str) -> Result<DeletedTaxon> {
    let f = expect_fields(line, 1)?;
    Ok(DeletedTaxon::new(tax_id(f[0], "tax_id")?))
}
