//! Taxon lookups and tree-shaped queries
//!
//! Every endpoint resolves the requested id first: merged ids follow their
//! merge, deleted ids answer `410 GONE`. Tree endpoints (descendants,
//! children, siblings, leaves, ancestors) translate the anchor's encoding
//! into an interval predicate and AND it with any search fields.

pub mod queries;
pub mod routes;

pub use routes::taxa_routes;
