//! Typed search over every record kind
//!
//! `GET <kind>/search` reads the search fields from query parameters and
//! `POST <kind>/search` from a JSON object. Both are generic over
//! [`Record`](crate::models::Record), so each kind gets its routes from the
//! same handlers.

pub mod queries;
pub mod routes;

pub use routes::search_routes;
