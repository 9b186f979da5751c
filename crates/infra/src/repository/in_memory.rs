use std::sync::RwLock;

use shelf_products::Product;

use super::{InsertMode, ProductRepository, repeated_name};
use crate::error::StoreError;

/// In-memory product repository.
///
/// Intended for tests/dev. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn list(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::Poisoned)?;
        Ok(products.clone())
    }

    fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::Poisoned)?;
        Ok(products.iter().filter(|p| p.name() == name).cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::Poisoned)?;
        Ok(products.len())
    }

    fn insert(&self, batch: Vec<Product>, mode: InsertMode) -> Result<usize, StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::Poisoned)?;

        if mode == InsertMode::OnlyIfEmpty && !products.is_empty() {
            return Ok(0);
        }

        // Validate the whole batch before touching the collection.
        if let Some(name) = repeated_name(&batch) {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        if let Some(existing) = batch
            .iter()
            .find(|new| products.iter().any(|p| p.name() == new.name()))
        {
            return Err(StoreError::DuplicateName(existing.name().to_string()));
        }

        let inserted = batch.len();
        products.extend(batch);
        Ok(inserted)
    }

    fn delete_at(&self, index: usize) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(|_| StoreError::Poisoned)?;

        if index >= products.len() {
            return Err(StoreError::IndexOutOfRange {
                index,
                len: products.len(),
            });
        }

        Ok(products.remove(index))
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
