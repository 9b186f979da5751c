//! Product list presenter.

use chrono::NaiveDate;
use thiserror::Error;

use shelf_core::DomainError;
use shelf_events::ChangeFeed;
use shelf_infra::{ProductStore, StoreChange, StoreError};
use shelf_products::{Product, ProductDraft};

use crate::view::{ProductListView, ProductRow};

#[derive(Debug, Error)]
pub enum PresenterError {
    #[error("invalid product: {0}")]
    Invalid(#[from] DomainError),

    #[error("{}", duplicate_name_title(.0))]
    DuplicateName(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PresenterError {
    /// Whether the session should end (the store itself failed).
    pub fn is_fatal(&self) -> bool {
        matches!(self, PresenterError::Store(err) if err.is_fatal())
    }
}

fn duplicate_name_title(name: &str) -> String {
    format!("There's already a product named {name} in the database")
}

/// Keeps a rendered product list in sync with a [`ProductStore`].
///
/// The presenter owns its store subscription: it is registered in [`new`](Self::new)
/// and released exactly once when the presenter is closed or dropped. Notifications
/// are queued and applied by [`pump`](Self::pump), which always re-reads the whole list
/// rather than patching rows.
///
/// Row positions passed to [`delete_row`](Self::delete_row) are positions in the last
/// rendered snapshot, which matches the store order as long as nothing else wrote since
/// the last render.
pub struct ProductListPresenter<V> {
    store: ProductStore,
    view: V,
    rows: Vec<ProductRow>,
    changes: ChangeFeed<StoreChange>,
}

impl<V> ProductListPresenter<V>
where
    V: ProductListView,
{
    pub fn new(store: ProductStore, view: V) -> Self {
        let changes = store.changes();
        Self {
            store,
            view,
            rows: Vec::new(),
            changes,
        }
    }

    /// Seed an empty store with `seed` (may be empty) and render the list.
    pub fn start(&mut self, seed: Vec<Product>) -> Result<(), PresenterError> {
        let inserted = self.store.seed_if_empty(seed)?;
        if inserted > 0 {
            tracing::info!(count = inserted, "store was empty; demo products added");
        }
        self.refresh()
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Rows as last rendered.
    pub fn rows(&self) -> &[ProductRow] {
        &self.rows
    }

    /// Re-read and re-render unconditionally.
    pub fn refresh(&mut self) -> Result<(), PresenterError> {
        self.changes.drain();
        self.reload()
    }

    /// Apply queued store notifications; returns how many were pending.
    pub fn pump(&mut self) -> Result<usize, PresenterError> {
        let pending = self.changes.drain().len();
        if pending > 0 {
            self.reload()?;
        }
        Ok(pending)
    }

    /// Validate form input and add it unless the name is already taken.
    ///
    /// Rejections are shown to the user as an alert and returned as errors; the store
    /// is untouched in that case.
    pub fn add_product(
        &mut self,
        draft: &ProductDraft,
        today: NaiveDate,
    ) -> Result<(), PresenterError> {
        let product = match draft.parse(today) {
            Ok(product) => product,
            Err(err) => {
                self.view.show_alert(&format!("Invalid product: {err}"));
                return Err(err.into());
            }
        };

        if !self.store.find_by_name(product.name())?.is_empty() {
            return Err(self.reject_duplicate(product.name().to_string()));
        }

        match self.store.add(product) {
            Ok(()) => Ok(()),
            Err(StoreError::DuplicateName(name)) => Err(self.reject_duplicate(name)),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete the product shown at `row`.
    pub fn delete_row(&mut self, row: usize) -> Result<Product, PresenterError> {
        Ok(self.store.delete_at(row)?)
    }

    /// Release the store subscription and hand back the view.
    pub fn close(self) -> V {
        let Self { view, changes, .. } = self;
        changes.cancel();
        view
    }

    fn reject_duplicate(&mut self, name: String) -> PresenterError {
        tracing::warn!(%name, "add rejected: duplicate name");
        self.view.show_alert(&duplicate_name_title(&name));
        PresenterError::DuplicateName(name)
    }

    fn reload(&mut self) -> Result<(), PresenterError> {
        let products = self.store.list_all()?;
        self.rows = products.iter().map(ProductRow::from).collect();
        self.view.render(&self.rows);
        Ok(())
    }
}

impl<V> core::fmt::Debug for ProductListPresenter<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProductListPresenter")
            .field("rows", &self.rows.len())
            .field("subscription", self.changes.subscription())
            .finish()
    }
}
