use shelf_products::Product;

/// Display snapshot of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub title: String,
    pub detail: String,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            title: product.name().to_string(),
            detail: product.detail_line(),
        }
    }
}

/// What the presenter needs from a concrete UI.
pub trait ProductListView {
    /// Replace everything on screen with `rows`, in order.
    fn render(&mut self, rows: &[ProductRow]);

    /// Show a modal message with a single "OK" action.
    fn show_alert(&mut self, title: &str);
}
