//! Tree-shaped searches anchored at one taxon
//!
//! The request's search fields are compiled before the anchor is looked up,
//! so a malformed filter is a `400` even for an unknown anchor.

use serde::Serialize;
use sqlx::PgPool;

use super::get::resolve_anchor;
use crate::db::{run_search, SearchPage};
use crate::error::ApiResult;
use crate::models::{Record, TaxonRow};
use crate::search::{compile, PaginationLimits, SearchSpec};
use crate::tree::{TaxId, TreeQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeRelation {
    Descendants { inclusive: bool },
    Children,
    Siblings,
    Leaves,
    Ancestors { inclusive: bool },
}

impl TreeRelation {
    pub fn name(self) -> &'static str {
        match self {
            TreeRelation::Descendants { .. } => "descendants",
            TreeRelation::Children => "children",
            TreeRelation::Siblings => "siblings",
            TreeRelation::Leaves => "leaves",
            TreeRelation::Ancestors { .. } => "ancestors",
        }
    }

    pub fn query(self, anchor: &TaxonRow) -> TreeQuery {
        let node = anchor.encoded_node();
        match self {
            TreeRelation::Descendants { inclusive } => TreeQuery::subtree(&node, inclusive),
            TreeRelation::Children => TreeQuery::children(&node),
            TreeRelation::Siblings => TreeQuery::siblings(&node),
            TreeRelation::Leaves => TreeQuery::leaves(&node),
            TreeRelation::Ancestors { inclusive } => TreeQuery::ancestors(&node, inclusive),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TreeSearchResult {
    pub anchor: TaxId,
    pub merged_from: Option<TaxId>,
    pub page: SearchPage<TaxonRow>,
}

#[tracing::instrument(skip(pool, limits, spec), fields(relation = relation.name()))]
pub async fn handle(
    pool: &PgPool,
    limits: &PaginationLimits,
    tax_id: TaxId,
    relation: TreeRelation,
    spec: SearchSpec,
) -> ApiResult<TreeSearchResult> {
    let compiled = compile(TaxonRow::KIND.schema(), &spec, limits)?;
    let anchor = resolve_anchor(pool, tax_id).await?;
    let query = relation.query(&anchor.taxon);

    let page = run_search::<TaxonRow>(pool, compiled, Some(&query)).await?;

    Ok(TreeSearchResult {
        anchor: anchor.taxon.tax_id,
        merged_from: anchor.merged_from,
        page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{TreeOrder, TreePredicate};

    fn row(tax_id: TaxId, sequence_id: i64, parent_sequence_id: Option<i64>, right_bound: i64) -> TaxonRow {
        TaxonRow {
            tax_id,
            parent_tax_id: 1,
            rank: "genus".to_string(),
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
            sequence_id,
            parent_sequence_id,
            depth: 2,
            right_bound,
            is_leaf: right_bound == sequence_id + 1,
        }
    }

    #[test]
    fn test_relation_queries() {
        let anchor = row(2, 2, Some(1), 5);

        let q = TreeRelation::Descendants { inclusive: false }.query(&anchor);
        assert_eq!(q.predicate, TreePredicate::SequenceRange { start: 3, end: 5 });
        assert_eq!(q.order, TreeOrder::Preorder);

        let q = TreeRelation::Descendants { inclusive: true }.query(&anchor);
        assert_eq!(q.predicate, TreePredicate::SequenceRange { start: 2, end: 5 });

        let q = TreeRelation::Siblings.query(&anchor);
        assert_eq!(q.predicate, TreePredicate::ChildOf { parent_sequence_id: 1 });

        let q = TreeRelation::Children.query(&anchor);
        assert_eq!(q.predicate, TreePredicate::ChildOf { parent_sequence_id: 2 });

        let q = TreeRelation::Ancestors { inclusive: false }.query(&anchor);
        assert_eq!(q.order, TreeOrder::Depth);
    }

    #[test]
    fn test_root_is_its_own_only_sibling() {
        let root = row(1, 1, None, 6);
        let q = TreeRelation::Siblings.query(&root);
        assert_eq!(q.predicate, TreePredicate::SequenceEquals { sequence_id: 1 });
    }

    #[test]
    fn test_names() {
        assert_eq!(TreeRelation::Leaves.name(), "leaves");
        assert_eq!(TreeRelation::Ancestors { inclusive: true }.name(), "ancestors");
    }
}
