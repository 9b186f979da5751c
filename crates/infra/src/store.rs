//! Product store: atomic writes first, change notifications second.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use shelf_core::ProductId;
use shelf_events::{ChangeBus, ChangeFeed, Event, InMemoryChangeBus, Subscription};
use shelf_products::Product;

use crate::config::{StoreConfig, StoreLocation};
use crate::error::StoreError;
use crate::repository::{
    InMemoryProductRepository, InsertMode, ProductRepository, SqliteProductRepository,
};

/// Notification emitted after a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Inserted {
        count: usize,
        committed_at: DateTime<Utc>,
    },
    Deleted {
        index: usize,
        product_id: ProductId,
        committed_at: DateTime<Utc>,
    },
}

impl Event for StoreChange {
    fn event_type(&self) -> &'static str {
        match self {
            StoreChange::Inserted { .. } => "products.store.inserted",
            StoreChange::Deleted { .. } => "products.store.deleted",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StoreChange::Inserted { committed_at, .. } => *committed_at,
            StoreChange::Deleted { committed_at, .. } => *committed_at,
        }
    }
}

/// Handle to the product collection.
///
/// Cloning is cheap; all clones share one repository and one change bus, so a write
/// through any handle notifies every subscriber of every handle.
///
/// ## Ordering invariant
///
/// Subscribers are notified only after the repository has committed the write, exactly
/// once per committed transaction. Rejected or skipped writes notify nobody.
#[derive(Debug, Clone)]
pub struct ProductStore {
    repository: Arc<dyn ProductRepository>,
    bus: Arc<InMemoryChangeBus<StoreChange>>,
}

impl ProductStore {
    pub fn new(repository: impl ProductRepository + 'static) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            bus: Arc::new(InMemoryChangeBus::new()),
        }
    }

    /// Store backed by process memory (tests/dev).
    pub fn in_memory() -> Self {
        Self::new(InMemoryProductRepository::new())
    }

    /// Open the SQLite store described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let repository = match &config.location {
            StoreLocation::InMemory => SqliteProductRepository::open_in_memory(),
            StoreLocation::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| StoreError::storage("create_data_dir", e))?;
                }
                SqliteProductRepository::open(path)
            }
        }
        .inspect_err(|err| tracing::error!(error = %err, "failed to open product store"))?;

        tracing::info!(location = %repository.location(), "product store opened");
        Ok(Self::new(repository))
    }

    pub fn location(&self) -> String {
        self.repository.location()
    }

    /// All products, in insertion order.
    pub fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        self.repository
            .list()
            .inspect_err(|err| log_failure("list_all", err))
    }

    /// Products whose name equals `name` exactly.
    pub fn find_by_name(&self, name: &str) -> Result<Vec<Product>, StoreError> {
        self.repository
            .find_by_name(name)
            .inspect_err(|err| log_failure("find_by_name", err))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.repository
            .count()
            .inspect_err(|err| log_failure("count", err))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Insert one product in its own transaction.
    #[instrument(skip_all, fields(name = %product.name()))]
    pub fn add(&self, product: Product) -> Result<(), StoreError> {
        self.insert("add", vec![product], InsertMode::Always)
            .map(|_| ())
    }

    /// Insert a batch in one transaction (all or nothing, one notification).
    #[instrument(skip_all, fields(batch = products.len()))]
    pub fn add_all(&self, products: Vec<Product>) -> Result<usize, StoreError> {
        self.insert("add_all", products, InsertMode::Always)
    }

    /// Insert `products` only if the store is currently empty.
    ///
    /// Returns how many products were inserted; 0 means the store already had data.
    #[instrument(skip_all, fields(batch = products.len()))]
    pub fn seed_if_empty(&self, products: Vec<Product>) -> Result<usize, StoreError> {
        let inserted = self.insert("seed_if_empty", products, InsertMode::OnlyIfEmpty)?;
        if inserted == 0 {
            tracing::debug!("store already populated; seed skipped");
        }
        Ok(inserted)
    }

    /// Remove the product at `index` of the current `list_all` order.
    #[instrument(skip(self))]
    pub fn delete_at(&self, index: usize) -> Result<Product, StoreError> {
        let removed = self
            .repository
            .delete_at(index)
            .inspect_err(|err| log_failure("delete_at", err))?;

        tracing::info!(name = %removed.name(), "product deleted");
        self.notify(StoreChange::Deleted {
            index,
            product_id: removed.id_typed(),
            committed_at: Utc::now(),
        })?;

        Ok(removed)
    }

    /// Call `handler` after every committed mutation, for as long as the returned
    /// handle is alive.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&StoreChange) + Send + Sync + 'static,
    {
        self.bus.subscribe(handler)
    }

    /// Queue every committed mutation on a channel.
    pub fn changes(&self) -> ChangeFeed<StoreChange> {
        self.bus.feed()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.subscriber_count()
    }

    fn insert(
        &self,
        operation: &'static str,
        products: Vec<Product>,
        mode: InsertMode,
    ) -> Result<usize, StoreError> {
        if products.is_empty() {
            return Ok(0);
        }

        let inserted = self
            .repository
            .insert(products, mode)
            .inspect_err(|err| log_failure(operation, err))?;

        if inserted > 0 {
            tracing::info!(operation, count = inserted, "products inserted");
            self.notify(StoreChange::Inserted {
                count: inserted,
                committed_at: Utc::now(),
            })?;
        }

        Ok(inserted)
    }

    fn notify(&self, change: StoreChange) -> Result<(), StoreError> {
        self.bus.publish(&change).map(|_| ()).map_err(|err| {
            tracing::error!(error = %err, event_type = change.event_type(), "write committed but subscribers were not notified");
            StoreError::Notify(err.to_string())
        })
    }
}

fn log_failure(operation: &'static str, err: &StoreError) {
    if err.is_fatal() {
        tracing::error!(operation, error = %err, "product store failure");
    } else {
        tracing::warn!(operation, error = %err, "product store request rejected");
    }
}
