//! SQL rendering and execution of compiled searches
//!
//! A compiled search becomes two statements over the same filter: a count
//! that ignores paging and a bounded fetch. Tree predicates from the
//! interval engine are ANDed in front of the field predicates.

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::DbResult;
use crate::models::Record;
use crate::search::{CompiledSearch, Predicate, PredicateOp, RecordSchema, SqlValue};
use crate::tree::{TreePredicate, TreeQuery};

/// One page of results plus the unpaginated match count
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage<T> {
    pub count: i64,
    pub limit: i64,
    pub offset: i64,
    pub results: Vec<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

pub fn count_query(
    schema: &RecordSchema,
    search: &CompiledSearch,
    tree: Option<&TreeQuery>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", schema.table));
    push_filter(&mut qb, tree.map(|t| &t.predicate), &search.predicates);
    qb
}

pub fn fetch_query(
    schema: &RecordSchema,
    search: &CompiledSearch,
    tree: Option<&TreeQuery>,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        schema.select_list(),
        schema.table
    ));
    push_filter(&mut qb, tree.map(|t| &t.predicate), &search.predicates);

    qb.push(" ORDER BY ");
    match tree.map(|t| t.order.column()) {
        Some(column) if column != schema.order_by => {
            qb.push(column).push(", ").push(schema.order_by);
        },
        _ => {
            qb.push(schema.order_by);
        },
    }

    qb.push(" LIMIT ")
        .push_bind(search.page.limit)
        .push(" OFFSET ")
        .push_bind(search.page.offset);
    qb
}

fn push_filter(
    qb: &mut QueryBuilder<'static, Postgres>,
    tree: Option<&TreePredicate>,
    predicates: &[Predicate],
) {
    let mut first = true;
    let mut next_clause = |qb: &mut QueryBuilder<'static, Postgres>| {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    if let Some(tree) = tree {
        next_clause(qb);
        push_tree_predicate(qb, tree);
    }

    for predicate in predicates {
        next_clause(qb);
        push_predicate(qb, predicate);
    }
}

fn push_tree_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: &TreePredicate) {
    qb.push("(");
    match *predicate {
        TreePredicate::SequenceRange { start, end } => {
            qb.push("sequence_id >= ")
                .push_bind(start)
                .push(" AND sequence_id < ")
                .push_bind(end);
        },
        TreePredicate::LeavesInRange { start, end } => {
            qb.push("is_leaf AND sequence_id >= ")
                .push_bind(start)
                .push(" AND sequence_id < ")
                .push_bind(end);
        },
        TreePredicate::SequenceEquals { sequence_id } => {
            qb.push("sequence_id = ").push_bind(sequence_id);
        },
        TreePredicate::Encloses { target, inclusive } => {
            qb.push("sequence_id <= ")
                .push_bind(target)
                .push(" AND right_bound > ")
                .push_bind(target);
            if !inclusive {
                qb.push(" AND sequence_id <> ").push_bind(target);
            }
        },
        TreePredicate::ChildOf { parent_sequence_id } => {
            qb.push("parent_sequence_id = ").push_bind(parent_sequence_id);
        },
    }
    qb.push(")");
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, predicate: &Predicate) {
    match &predicate.op {
        PredicateOp::Equals(value) => {
            qb.push(predicate.column).push(" = ");
            push_value(qb, value);
        },
        PredicateOp::TextEquals(text) => {
            qb.push(predicate.column).push("::text = ").push_bind(text.clone());
        },
        PredicateOp::Like(pattern) => {
            qb.push(predicate.column).push(" LIKE ").push_bind(pattern.clone());
        },
        PredicateOp::Between(lower, upper) => {
            qb.push(predicate.column).push(" BETWEEN ");
            push_value(qb, lower);
            qb.push(" AND ");
            push_value(qb, upper);
        },
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &SqlValue) {
    match value {
        SqlValue::Text(v) => qb.push_bind(v.clone()),
        SqlValue::Integer(v) => qb.push_bind(*v),
        SqlValue::Float(v) => qb.push_bind(*v),
        SqlValue::Decimal(v) => qb.push_bind(v.clone()),
        SqlValue::Boolean(v) => qb.push_bind(*v),
        SqlValue::Date(v) => qb.push_bind(*v),
        SqlValue::DateTime(v) => qb.push_bind(*v),
    };
}

/// Run a compiled search for record type `T`, optionally restricted by a
/// tree query (taxa only).
#[tracing::instrument(skip(pool, search, tree), fields(table = T::KIND.schema().table))]
pub async fn run_search<T: Record>(
    pool: &PgPool,
    search: CompiledSearch,
    tree: Option<&TreeQuery>,
) -> DbResult<SearchPage<T>> {
    let schema = T::KIND.schema();
    let mut count = count_query(schema, &search, tree);
    let mut fetch = fetch_query(schema, &search, tree);

    let (total, results) = tokio::try_join!(
        count.build_query_scalar::<i64>().fetch_one(pool),
        fetch.build_query_as::<T>().fetch_all(pool),
    )?;

    tracing::debug!(count = total, returned = results.len(), "Search completed");

    Ok(SearchPage {
        count: total,
        limit: search.page.limit,
        offset: search.page.offset,
        results,
        warnings: search.warnings,
    })
}
