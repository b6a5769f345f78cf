pub mod get;
pub mod relation;
pub mod tree;

pub use get::{resolve_anchor, ResolvedTaxon};
pub use tree::{TreeRelation, TreeSearchResult};
