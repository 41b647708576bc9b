//! Broadcast channel for gameplay events.
//!
//! Every subscriber owns the receiving end of its own crossbeam channel and
//! drains it whenever it likes. Publishing clones the event into each
//! channel in subscription order. A subscriber whose receiver was dropped
//! without unsubscribing is pruned on the next publish.
//!
//! # Example
//!
//! ```
//! use strider_actions::events::{EventBus, GameEvent};
//! use strider_physics::BodyHandle;
//!
//! let mut bus = EventBus::new();
//! let subscription = bus.subscribe();
//! bus.publish(GameEvent::DamageReceived {
//!     target: BodyHandle(1),
//!     source: BodyHandle(0),
//!     damage: 3,
//! });
//! assert_eq!(subscription.drain().len(), 1);
//! assert!(bus.unsubscribe(subscription.id()));
//! ```

use std::fmt;

use rapier2d::crossbeam::channel::{unbounded, Receiver, Sender};
use strider_physics::layers::CollisionLayers;
use strider_physics::motion::Bounds;
use strider_physics::BodyHandle;

/// Domain events exchanged between actions and the simulation driver.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// `target` lost `damage` hit points to an attack by `source`.
    DamageReceived {
        target: BodyHandle,
        source: BodyHandle,
        damage: i32,
    },
    /// `source` swung at `area`, hurting bodies on `mask`.
    AttackArea {
        source: BodyHandle,
        area: Bounds,
        mask: CollisionLayers,
        damage: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u32);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0)
    }
}

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<GameEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Take every event delivered so far.
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

/// Multicast event channel.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriberId, Sender<GameEvent>)>,
    next_id: u32,
    published: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        let (sender, receiver) = unbounded();
        self.subscribers.push((id, sender));
        tracing::trace!(%id, "subscribed");
        Subscription { id, receiver }
    }

    /// Remove a subscriber. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        let removed = self.subscribers.len() != before;
        if removed {
            tracing::trace!(%id, "unsubscribed");
        }
        removed
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.iter().any(|(subscriber, _)| *subscriber == id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Total number of events published on this bus.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Deliver `event` to every subscriber. Returns the number of receivers
    /// that got it.
    pub fn publish(&mut self, event: GameEvent) -> usize {
        self.published += 1;
        let mut delivered = 0;
        self.subscribers.retain(|(id, sender)| {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                tracing::warn!(%id, "dropping subscriber with a closed receiver");
                false
            }
        });
        delivered
    }
}
