//! In-process change bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use thiserror::Error;

use crate::bus::{ChangeBus, Registration, Subscription, SubscriptionId};
use crate::event::Event;

type Handler<M> = Arc<dyn Fn(&M) + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InMemoryBusError {
    /// Publish failed due to internal lock poisoning.
    #[error("change bus lock poisoned")]
    Poisoned,
}

struct Registry<M> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler<M>)>>,
}

impl<M> Registration for Registry<M>
where
    M: 'static,
{
    fn detach(&self, id: SubscriptionId) {
        // Teardown must not fail; a poisoned list is still a valid list.
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers.retain(|(handler_id, _)| *handler_id != id);
        tracing::trace!(subscription_id = id, "subscription released");
    }

    fn contains(&self, id: SubscriptionId) -> bool {
        self.handlers
            .lock()
            .map(|handlers| handlers.iter().any(|(handler_id, _)| *handler_id == id))
            .unwrap_or(false)
    }
}

/// In-memory pub/sub bus.
///
/// - No IO / no async
/// - Handlers run synchronously on the publishing thread, in registration order
/// - Handlers run outside the registry lock, so they may subscribe or cancel
pub struct InMemoryChangeBus<M> {
    registry: Arc<Registry<M>>,
}

impl<M> InMemoryChangeBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryChangeBus<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(1),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }
}

impl<M> core::fmt::Debug for InMemoryChangeBus<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let subscribers = self.registry.handlers.lock().map(|h| h.len()).ok();
        f.debug_struct("InMemoryChangeBus")
            .field("subscribers", &subscribers)
            .finish()
    }
}

impl<M> ChangeBus<M> for InMemoryChangeBus<M>
where
    M: Event,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: &M) -> Result<usize, Self::Error> {
        let snapshot: Vec<Handler<M>> = {
            let handlers = self
                .registry
                .handlers
                .lock()
                .map_err(|_| InMemoryBusError::Poisoned)?;
            handlers.iter().map(|(_, handler)| Arc::clone(handler)).collect()
        };

        for handler in &snapshot {
            handler(message);
        }

        tracing::debug!(
            event_type = message.event_type(),
            subscribers = snapshot.len(),
            "change published"
        );
        Ok(snapshot.len())
    }

    fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);

        // If the lock is poisoned we still hand out a handle; it is simply inactive.
        if let Ok(mut handlers) = self.registry.handlers.lock() {
            let handler: Handler<M> = Arc::new(handler);
            handlers.push((id, handler));
        }

        let registry: Weak<Registry<M>> = Arc::downgrade(&self.registry);
        let registry: Weak<dyn Registration> = registry;
        Subscription::new(id, registry)
    }

    fn subscriber_count(&self) -> usize {
        self.registry.handlers.lock().map(|h| h.len()).unwrap_or(0)
    }
}
