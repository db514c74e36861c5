//! Repository module
//!
//! The data access layer: synchronous diesel queries against the pooled
//! SQLite connection. Functions return `anyhow::Result`; handlers decide
//! which HTTP status a failure maps to.

mod basket_repo;
mod product_repo;
mod review_repo;
mod user_repo;

pub use basket_repo::*;
pub use product_repo::*;
pub use review_repo::*;
pub use user_repo::*;
