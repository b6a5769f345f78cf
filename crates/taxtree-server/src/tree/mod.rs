//! Nested-set encoding of the taxonomy tree
//!
//! The importer turns the flat `(tax_id, parent_tax_id)` edge list into a
//! preorder interval encoding once per import. Every hierarchy question asked
//! at query time then reduces to a range comparison on two integers:
//!
//! ```text
//! B is a descendant-or-self of A  <=>  A.sequence_id <= B.sequence_id < A.right_bound
//! ```
//!
//! - [`encoder`] builds the encoding and rejects structurally broken edge sets
//! - [`interval`] derives subtree, sibling, leaf, ancestor and child queries
//!   from an encoded anchor node

pub mod encoder;
pub mod interval;

use serde::{Deserialize, Serialize};

pub use encoder::{encode, EncodeError, EncodedTree, Edge};
pub use interval::{Relation, TreeOrder, TreePredicate, TreeQuery};

/// NCBI taxonomy identifier
pub type TaxId = i64;

/// Position of one node in the nested-set encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeEncoding {
    /// Preorder position, starting at 1 for the root
    pub sequence_id: i64,
    /// `sequence_id` of the parent, `None` only for the root
    pub parent_sequence_id: Option<i64>,
    /// Root is depth 1
    pub depth: i32,
    /// Exclusive end of the node's subtree range
    pub right_bound: i64,
    pub is_leaf: bool,
}

impl TreeEncoding {
    pub fn is_root(&self) -> bool {
        self.parent_sequence_id.is_none()
    }

    /// Number of nodes in the subtree rooted here, the node itself included
    pub fn subtree_size(&self) -> i64 {
        self.right_bound - self.sequence_id
    }

    /// Whether `sequence_id` falls inside this node's half-open range
    pub fn encloses(&self, sequence_id: i64) -> bool {
        self.sequence_id <= sequence_id && sequence_id < self.right_bound
    }
}

/// A taxon together with its encoding
///
/// Produced by the encoder for every node and loaded back from the database
/// as the anchor of interval queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedNode {
    pub tax_id: TaxId,
    /// Raw parent from the dump; the root points at itself
    pub parent_tax_id: TaxId,
    #[serde(flatten)]
    pub encoding: TreeEncoding,
}
