//! Topic-based event bus implementation.

use std::sync::Arc;

use combat_core::{CombatEvent, CombatEventType};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Hits, blocks and self-injuries inside a running session
    Combat,
    /// Session start, terminal transitions and reward claims
    Lifecycle,
}

impl Topic {
    pub fn of(event: &CombatEvent) -> Self {
        match event.kind {
            CombatEventType::EnemyStruck { .. }
            | CombatEventType::PlayerStruck { .. }
            | CombatEventType::PlayerInjured { .. }
            | CombatEventType::EnemyInjured { .. } => Topic::Combat,
            CombatEventType::SessionStarted { .. }
            | CombatEventType::Victory
            | CombatEventType::Defeat
            | CombatEventType::Retreated
            | CombatEventType::Expired
            | CombatEventType::RewardsClaimed { .. } => Topic::Lifecycle,
        }
    }
}

struct Channels {
    combat: broadcast::Sender<CombatEvent>,
    lifecycle: broadcast::Sender<CombatEvent>,
    all: broadcast::Sender<CombatEvent>,
}

/// Topic-based event bus
///
/// Publishing is best-effort: events sent while nobody listens are dropped,
/// and slow subscribers see `RecvError::Lagged` rather than blocking the
/// service.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                combat: broadcast::channel(capacity).0,
                lifecycle: broadcast::channel(capacity).0,
                all: broadcast::channel(capacity).0,
            }),
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<CombatEvent> {
        match topic {
            Topic::Combat => &self.channels.combat,
            Topic::Lifecycle => &self.channels.lifecycle,
        }
    }

    /// Publish an event to its topic and to the all-events stream
    pub fn publish(&self, event: CombatEvent) {
        let topic = Topic::of(&event);

        if self.sender(topic).send(event.clone()).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
        if self.channels.all.send(event).is_err() {
            tracing::trace!("No subscribers for combat events");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<CombatEvent> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to every event regardless of topic
    pub fn subscribe_all(&self) -> broadcast::Receiver<CombatEvent> {
        self.channels.all.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.channels.all.receiver_count())
            .finish()
    }
}
