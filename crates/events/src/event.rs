use chrono::{DateTime, Utc};

/// A domain-agnostic change notification.
///
/// Notifications are:
/// - **immutable** (treat them as facts about a committed write)
/// - emitted **after** the write they describe has committed
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "products.store.inserted").
    fn event_type(&self) -> &'static str;

    /// When the underlying write committed.
    fn occurred_at(&self) -> DateTime<Utc>;
}
