//! Interval queries over encoded nodes
//!
//! Everything here is pure: a query is described as a [`TreePredicate`] plus
//! an ordering, and the persistence layer turns it into SQL. The same
//! predicate can be evaluated in memory against an [`EncodedTree`].

use serde::Serialize;

use super::{EncodedNode, EncodedTree, TreeEncoding};

/// Strict descendant test: `b` lies inside `a`'s range and is not `a`
pub fn is_descendant(a: &TreeEncoding, b: &TreeEncoding) -> bool {
    a.sequence_id < b.sequence_id && b.sequence_id < a.right_bound
}

pub fn is_descendant_inclusive(a: &TreeEncoding, b: &TreeEncoding) -> bool {
    a.encloses(b.sequence_id)
}

/// How `other` relates to an anchor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Same,
    /// `other` is an ancestor of the anchor
    Ancestor,
    /// `other` is a descendant of the anchor
    Descendant,
    Unrelated,
}

pub fn relation(anchor: &TreeEncoding, other: &TreeEncoding) -> Relation {
    if anchor.sequence_id == other.sequence_id {
        Relation::Same
    } else if is_descendant(anchor, other) {
        Relation::Descendant
    } else if is_descendant(other, anchor) {
        Relation::Ancestor
    } else {
        Relation::Unrelated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreePredicate {
    /// `start <= sequence_id < end`
    SequenceRange { start: i64, end: i64 },

    /// `is_leaf AND start <= sequence_id < end`
    LeavesInRange { start: i64, end: i64 },

    /// `sequence_id = sequence_id`
    SequenceEquals { sequence_id: i64 },

    /// `sequence_id <= target < right_bound`; the target itself only when inclusive
    Encloses { target: i64, inclusive: bool },

    /// `parent_sequence_id = parent_sequence_id`
    ChildOf { parent_sequence_id: i64 },
}

impl TreePredicate {
    pub fn matches(&self, node: &EncodedNode) -> bool {
        let e = &node.encoding;
        match *self {
            TreePredicate::SequenceRange { start, end } => {
                start <= e.sequence_id && e.sequence_id < end
            },
            TreePredicate::LeavesInRange { start, end } => {
                e.is_leaf && start <= e.sequence_id && e.sequence_id < end
            },
            TreePredicate::SequenceEquals { sequence_id } => e.sequence_id == sequence_id,
            TreePredicate::Encloses { target, inclusive } => {
                e.encloses(target) && (inclusive || e.sequence_id != target)
            },
            TreePredicate::ChildOf { parent_sequence_id } => {
                e.parent_sequence_id == Some(parent_sequence_id)
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeOrder {
    /// Increasing `sequence_id`
    Preorder,
    /// Increasing `depth`, root first
    Depth,
}

impl TreeOrder {
    pub fn column(self) -> &'static str {
        match self {
            TreeOrder::Preorder => "sequence_id",
            TreeOrder::Depth => "depth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeQuery {
    pub predicate: TreePredicate,
    pub order: TreeOrder,
}

impl TreeQuery {
    fn preorder(predicate: TreePredicate) -> Self {
        Self {
            predicate,
            order: TreeOrder::Preorder,
        }
    }

    /// All descendants of `anchor`, plus the anchor itself when `inclusive`
    pub fn subtree(anchor: &EncodedNode, inclusive: bool) -> Self {
        let e = &anchor.encoding;
        let start = if inclusive {
            e.sequence_id
        } else {
            e.sequence_id + 1
        };
        Self::preorder(TreePredicate::SequenceRange {
            start,
            end: e.right_bound,
        })
    }

    /// Nodes sharing the anchor's parent, the anchor included.
    ///
    /// Matched on the parent's sequence id rather than the raw
    /// `parent_tax_id`: the root is its own raw parent and would otherwise
    /// show up among its children's siblings. The root is its only sibling.
    pub fn siblings(anchor: &EncodedNode) -> Self {
        match anchor.encoding.parent_sequence_id {
            Some(parent_sequence_id) => {
                Self::preorder(TreePredicate::ChildOf { parent_sequence_id })
            },
            None => Self::preorder(TreePredicate::SequenceEquals {
                sequence_id: anchor.encoding.sequence_id,
            }),
        }
    }

    pub fn leaves(anchor: &EncodedNode) -> Self {
        Self::preorder(TreePredicate::LeavesInRange {
            start: anchor.encoding.sequence_id,
            end: anchor.encoding.right_bound,
        })
    }

    /// The lineage from the root down to the anchor's parent (or the anchor)
    pub fn ancestors(anchor: &EncodedNode, inclusive: bool) -> Self {
        Self {
            predicate: TreePredicate::Encloses {
                target: anchor.encoding.sequence_id,
                inclusive,
            },
            order: TreeOrder::Depth,
        }
    }

    pub fn children(anchor: &EncodedNode) -> Self {
        Self::preorder(TreePredicate::ChildOf {
            parent_sequence_id: anchor.encoding.sequence_id,
        })
    }
}

impl EncodedTree {
    /// Evaluate a tree query in memory, in the query's order
    pub fn select(&self, query: &TreeQuery) -> Vec<&EncodedNode> {
        let mut selected: Vec<&EncodedNode> =
            self.iter().filter(|n| query.predicate.matches(n)).collect();

        if query.order == TreeOrder::Depth {
            // stable: equal depths keep preorder
            selected.sort_by_key(|n| n.encoding.depth);
        }

        selected
    }
}
