use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use shelf_core::{DomainError, DomainResult, Entity, ProductId, ValueObject};

/// Textual form of a product's start date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` start date.
pub fn parse_start_date(s: &str) -> DomainResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| DomainError::validation(format!("invalid start date '{s}': {e}")))
}

/// Non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price cannot be negative (got {amount})"
            )));
        }
        // Collapse "-0" so it neither displays nor persists with a sign.
        if amount.is_zero() {
            return Ok(Self(Decimal::ZERO));
        }
        Ok(Self(amount))
    }

    /// Price from an amount in cents.
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Price {}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim())
            .map_err(|_| DomainError::validation(format!("price must be a decimal number, got '{s}'")))?;
        Self::new(amount)
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Half-up to cents, like printf's %.2f on a stored double.
        let cents = self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "${cents:.2}")
    }
}

/// A stored product record.
///
/// Records are never edited after creation; the only lifecycle transitions are
/// insertion and deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Price,
    /// Conventionally 0–5 stars; not range-checked.
    rating: i32,
    start_date: NaiveDate,
}

impl Product {
    /// Create a new product with a fresh identifier.
    pub fn new(
        name: impl Into<String>,
        price: Price,
        rating: i32,
        start_date: NaiveDate,
    ) -> DomainResult<Self> {
        Self::with_id(ProductId::new(), name, price, rating, start_date)
    }

    /// Rebuild a product with a known identifier (e.g. loaded from storage).
    pub fn with_id(
        id: ProductId,
        name: impl Into<String>,
        price: Price,
        rating: i32,
        start_date: NaiveDate,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            price,
            rating,
            start_date,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// One-line summary: `$80.50, 2 stars, sold since 2013-02-28`.
    pub fn detail_line(&self) -> String {
        format!(
            "{}, {} stars, sold since {}",
            self.price,
            self.rating,
            self.start_date.format(DATE_FORMAT)
        )
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
