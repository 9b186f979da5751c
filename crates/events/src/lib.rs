//! Change notifications: store mutation → subscribers.

pub mod bus;
pub mod event;
pub mod in_memory_bus;

pub use bus::{ChangeBus, ChangeFeed, Subscription, SubscriptionId};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryChangeBus};
