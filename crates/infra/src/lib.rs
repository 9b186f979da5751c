//! Infrastructure layer: storage adapters, the notifying product store, configuration.

pub mod config;
pub mod error;
pub mod repository;
pub mod store;

mod integration_tests;

pub use config::{StoreConfig, StoreLocation};
pub use error::StoreError;
pub use repository::{
    InMemoryProductRepository, InsertMode, ProductRepository, SqliteProductRepository,
};
pub use store::{ProductStore, StoreChange};
