pub mod search;

pub use search::handle as search;
