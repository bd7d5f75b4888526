//! Topic-based event bus for combat events.
//!
//! Events are published to a topic and consumers subscribe only to the
//! topics they need, or to every event at once.

mod bus;

pub use bus::{EventBus, Topic};
