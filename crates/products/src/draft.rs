//! Raw data-entry form for a new product.

use chrono::NaiveDate;

use shelf_core::{DomainError, DomainResult};

use crate::product::{Price, Product};

/// Text exactly as typed into the "add a product" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub price: String,
    pub rating: String,
}

impl ProductDraft {
    pub fn new(name: impl Into<String>, price: impl Into<String>, rating: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            rating: rating.into(),
        }
    }

    /// The name the product will be stored under (surrounding whitespace removed).
    pub fn name(&self) -> &str {
        self.name.trim()
    }

    /// Validate the form and build a product starting on `start_date`.
    pub fn parse(&self, start_date: NaiveDate) -> DomainResult<Product> {
        let price: Price = self.price.parse()?;
        let rating: i32 = self.rating.trim().parse().map_err(|_| {
            DomainError::validation(format!("rating must be a whole number, got '{}'", self.rating))
        })?;

        Product::new(self.name(), price, rating, start_date)
    }
}
