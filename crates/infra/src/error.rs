use thiserror::Error;

/// Product store operation error.
///
/// - **DuplicateName** / **IndexOutOfRange**: rejected requests; the store is untouched
///   and callers recover locally.
/// - **Storage** / **Corrupt** / **Poisoned**: the backing store itself failed. These are
///   fatal for the session; the store logs them before returning.
/// - **Notify**: the write committed but subscribers could not be notified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("a product named '{0}' already exists")]
    DuplicateName(String),

    #[error("no product at position {index} (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("storage failure during {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    #[error("corrupt product record: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("change notification failed: {0}")]
    Notify(String),
}

impl StoreError {
    pub fn storage(operation: &'static str, err: impl core::fmt::Display) -> Self {
        Self::Storage {
            operation,
            message: err.to_string(),
        }
    }

    pub fn corrupt(err: impl core::fmt::Display) -> Self {
        Self::Corrupt(err.to_string())
    }

    /// Whether the error means the store can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StoreError::Storage { .. } | StoreError::Corrupt(_) | StoreError::Poisoned
        )
    }
}
