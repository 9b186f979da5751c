//! Change publishing/subscription abstraction (mechanics only).
//!
//! A bus distributes notifications about committed writes to every live subscriber.
//!
//! - **Commit first**: callers publish only after the write is durable; the bus never
//!   stores anything.
//! - **Exactly once per publish**: each live subscriber is invoked once per `publish` call.
//! - **Scoped registration**: `subscribe` returns a [`Subscription`] handle; the handler
//!   stays registered exactly as long as the handle is alive.
//!
//! ## Usage Pattern
//!
//! ```ignore
//! let bus = InMemoryChangeBus::<StoreChange>::new();
//! let subscription = bus.subscribe(|change| tracing::info!(?change, "store changed"));
//!
//! bus.publish(&change)?;       // handler runs
//! drop(subscription);          // handler unregistered
//! bus.publish(&change)?;       // nobody is notified
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Weak;
use std::time::Duration;

/// Identifier of a registered handler, unique per bus.
pub type SubscriptionId = u64;

/// Registry side of a subscription, with the message type erased.
pub(crate) trait Registration: Send + Sync {
    fn detach(&self, id: SubscriptionId);

    fn contains(&self, id: SubscriptionId) -> bool;
}

/// RAII handle for a registered change handler.
///
/// Dropping the handle (or calling [`Subscription::cancel`]) unregisters the handler.
/// Release happens exactly once: `cancel` consumes the handle, so it cannot be released
/// twice or used afterwards. The handle holds only a weak reference to the bus, so it may
/// safely outlive the bus.
#[must_use = "dropping a Subscription immediately unregisters its handler"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<dyn Registration>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: Weak<dyn Registration>) -> Self {
        Self { id, registry }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the handler is still registered on a live bus.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }

    /// Unregister the handler now.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.detach(self.id);
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A subscription that queues notifications on a channel.
///
/// Useful when the consumer runs its own loop (a UI frame, a terminal prompt) and wants
/// to pick up changes at its own pace instead of inside the writer's call stack.
///
/// ## Thread Safety
///
/// A feed is designed for single-threaded consumption. Messages are received in publish
/// order.
#[derive(Debug)]
pub struct ChangeFeed<M> {
    subscription: Subscription,
    receiver: Receiver<M>,
}

impl<M> ChangeFeed<M> {
    pub fn new(subscription: Subscription, receiver: Receiver<M>) -> Self {
        Self {
            subscription,
            receiver,
        }
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every message queued so far without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    /// Unregister the underlying handler now.
    pub fn cancel(self) {}
}

/// Domain-agnostic change bus (pub/sub abstraction).
///
/// ```text
/// write → commit → ChangeBus::publish → handler 1
///                                     → handler 2 (e.g. ChangeFeed → presenter)
/// ```
///
/// ## Thread Safety
///
/// The trait requires `Send + Sync`; store handles sharing one bus may live on
/// different threads.
pub trait ChangeBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Invoke every live handler once with `message`.
    ///
    /// Returns the number of handlers invoked.
    fn publish(&self, message: &M) -> Result<usize, Self::Error>;

    /// Register `handler`; it stays registered while the returned handle is alive.
    fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&M) + Send + Sync + 'static;

    /// Number of live handlers.
    fn subscriber_count(&self) -> usize;

    /// Subscribe with a handler that forwards every message into a channel.
    fn feed(&self) -> ChangeFeed<M>
    where
        M: Clone + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let subscription = self.subscribe(move |message: &M| {
            // Receiver gone means the feed is being dropped; its subscription goes next.
            let _ = tx.send(message.clone());
        });
        ChangeFeed::new(subscription, rx)
    }
}
