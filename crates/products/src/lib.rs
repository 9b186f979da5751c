//! Products domain module.
//!
//! The product record, its value objects, form parsing and demo seed data,
//! implemented as deterministic domain logic (no IO, no storage).

pub mod draft;
pub mod product;
pub mod seed;

pub use draft::ProductDraft;
pub use product::{DATE_FORMAT, Price, Product, parse_start_date};
pub use seed::seed_products;
