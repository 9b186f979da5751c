//! Product storage boundary.
//!
//! A repository owns the durable collection and makes every write atomic. It knows
//! nothing about notifications; `ProductStore` layers those on top.

pub mod in_memory;
pub mod sqlite;

use std::collections::HashSet;
use std::sync::Arc;

use shelf_products::Product;

use crate::error::StoreError;

pub use in_memory::InMemoryProductRepository;
pub use sqlite::SqliteProductRepository;

/// Precondition applied inside an insert transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InsertMode {
    /// Insert unconditionally.
    Always,
    /// Insert only if the store holds no products when the transaction starts.
    OnlyIfEmpty,
}

/// Ordered, name-unique product collection.
///
/// ## Ordering
///
/// `list` returns products in insertion order, and `delete_at` indexes into that same
/// order.
///
/// ## Atomicity
///
/// `insert` and `delete_at` each run as one transaction: either every write is visible
/// afterwards or none is. A batch containing a name that is already stored, or the same
/// name twice, is rejected as a whole with `StoreError::DuplicateName`.
pub trait ProductRepository: Send + Sync + core::fmt::Debug {
    fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Exact, case-sensitive name match.
    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    /// Insert `products` in order; returns how many were inserted (0 when skipped).
    fn insert(&self, products: Vec<Product>, mode: InsertMode) -> Result<usize, StoreError>;

    /// Remove and return the product at `index` in `list` order.
    fn delete_at(&self, index: usize) -> Result<Product, StoreError>;

    /// Human-readable location of the data (file path or "memory").
    fn location(&self) -> String;
}

impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list()
    }

    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        (**self).find_by_name(name)
    }

    fn count(&self) -> Result<usize, StoreError> {
        (**self).count()
    }

    fn insert(&self, products: Vec<Product>, mode: InsertMode) -> Result<usize, StoreError> {
        (**self).insert(products, mode)
    }

    fn delete_at(&self, index: usize) -> Result<Product, StoreError> {
        (**self).delete_at(index)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// First name repeated within `batch`, if any.
pub(crate) fn repeated_name(batch: &[Product]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(batch.len());
    batch
        .iter()
        .map(Product::name)
        .find(|name| !seen.insert(*name))
}
