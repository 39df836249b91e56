//! Match events and the sinks that receive them
//!
//! The state machine publishes every notable transition to an injected
//! [`EventSink`]. Presentation (sound, particles, HUD) subscribes through an
//! [`EventBus`] instead of reaching into the simulation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::power::PowerUpKind;
use super::state::{EndResult, GamePhase, MatchOutcome, Scores, Team};

/// Something that happened during the match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchEvent {
    MatchStarted,
    EndStarted {
        end: u32,
    },
    PhaseChanged {
        from: GamePhase,
        to: GamePhase,
    },
    TurnChanged {
        team: Team,
    },
    StoneSpawned {
        stone_id: u32,
        team: Team,
    },
    StoneLaunched {
        stone_id: u32,
        team: Team,
        velocity: Vec2,
    },
    /// Every stone came to rest
    StonesSettled,
    /// Two stones touched (fires for any pair, for cosmetic effects)
    StonesCollided {
        a: u32,
        b: u32,
        point: Vec2,
    },
    /// Arcade response applied by the active stone
    ArcadePush {
        striker: u32,
        struck: u32,
        impulse: Vec2,
        super_strength: bool,
    },
    EndScored(EndResult),
    PowerUpCollected {
        team: Team,
        kind: PowerUpKind,
        evicted: Option<PowerUpKind>,
    },
    PowerUpActivated {
        team: Team,
        kind: PowerUpKind,
        stone_id: u32,
    },
    /// Activation asked for a slot the bank doesn't have
    NoPowerAtSlot {
        team: Team,
        slot: usize,
    },
    Paused,
    Resumed,
    GameOver {
        outcome: MatchOutcome,
        scores: Scores,
    },
}

impl MatchEvent {
    /// Channel this event is published on
    pub fn channel(&self) -> Channel {
        match self {
            MatchEvent::MatchStarted
            | MatchEvent::EndStarted { .. }
            | MatchEvent::GameOver { .. } => Channel::Match,
            MatchEvent::PhaseChanged { .. } => Channel::Phase,
            MatchEvent::TurnChanged { .. }
            | MatchEvent::StoneSpawned { .. }
            | MatchEvent::StoneLaunched { .. }
            | MatchEvent::StonesSettled => Channel::Stone,
            MatchEvent::StonesCollided { .. } | MatchEvent::ArcadePush { .. } => Channel::Collision,
            MatchEvent::EndScored(_) => Channel::Scoring,
            MatchEvent::PowerUpCollected { .. }
            | MatchEvent::PowerUpActivated { .. }
            | MatchEvent::NoPowerAtSlot { .. } => Channel::PowerUp,
            MatchEvent::Paused | MatchEvent::Resumed => Channel::Pause,
        }
    }
}

/// Typed event channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Match,
    Phase,
    Stone,
    Collision,
    Scoring,
    PowerUp,
    Pause,
}

impl Channel {
    /// Registration table: every channel and its path name
    pub const ALL: [(Channel, &'static str); 7] = [
        (Channel::Match, "Match/Lifecycle"),
        (Channel::Phase, "Match/Phase"),
        (Channel::Stone, "Stone/Turn"),
        (Channel::Collision, "Stone/Collision"),
        (Channel::Scoring, "Match/Scoring"),
        (Channel::PowerUp, "PowerUp"),
        (Channel::Pause, "Match/Pause"),
    ];

    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(c, _)| *c == self)
            .map(|(_, name)| *name)
            .unwrap_or("")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(c, _)| *c)
    }
}

/// Receiver of match events
pub trait EventSink {
    fn publish(&mut self, event: &MatchEvent);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&mut self, _event: &MatchEvent) {}
}

/// Records every event in order
impl EventSink for Vec<MatchEvent> {
    fn publish(&mut self, event: &MatchEvent) {
        self.push(event.clone());
    }
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Callback = Box<dyn FnMut(&MatchEvent)>;

struct Subscriber {
    id: SubscriptionId,
    channel: Channel,
    order: i32,
    callback: Callback,
}

/// Publish/subscribe dispatcher keyed by [`Channel`]
///
/// Subscribers on a channel run in ascending `order`; equal orders run in
/// subscription order.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u32,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        channel: Channel,
        order: i32,
        callback: impl FnMut(&MatchEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        // Insert after every subscriber with order <= ours (stable)
        let pos = self
            .subscribers
            .iter()
            .position(|s| s.order > order)
            .unwrap_or(self.subscribers.len());
        self.subscribers.insert(
            pos,
            Subscriber {
                id,
                channel,
                order,
                callback: Box::new(callback),
            },
        );
        id
    }

    /// Subscribe by channel path name; `None` if the name isn't registered
    pub fn subscribe_named(
        &mut self,
        name: &str,
        order: i32,
        callback: impl FnMut(&MatchEvent) + 'static,
    ) -> Option<SubscriptionId> {
        let channel = Channel::from_name(name)?;
        Some(self.subscribe(channel, order, callback))
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.subscribers.iter().filter(|s| s.channel == channel).count()
    }
}

impl EventSink for EventBus {
    fn publish(&mut self, event: &MatchEvent) {
        let channel = event.channel();
        for sub in self.subscribers.iter_mut().filter(|s| s.channel == channel) {
            (sub.callback)(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_channel_table_round_trips() {
        for (channel, name) in Channel::ALL {
            assert_eq!(channel.name(), name);
            assert_eq!(Channel::from_name(name), Some(channel));
        }
        assert_eq!(Channel::from_name("Sound/OnPlay"), None);
    }

    #[test]
    fn test_bus_dispatches_by_channel_and_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();

        let l = log.clone();
        bus.subscribe(Channel::Pause, 10, move |_| l.borrow_mut().push("late"));
        let l = log.clone();
        bus.subscribe(Channel::Pause, -5, move |_| l.borrow_mut().push("early"));
        let l = log.clone();
        bus.subscribe(Channel::Pause, 10, move |_| l.borrow_mut().push("late2"));
        let l = log.clone();
        bus.subscribe(Channel::Scoring, 0, move |_| l.borrow_mut().push("scoring"));

        bus.publish(&MatchEvent::Paused);
        assert_eq!(*log.borrow(), vec!["early", "late", "late2"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = EventBus::new();
        let c = count.clone();
        let id = bus
            .subscribe_named("Match/Pause", 0, move |_| *c.borrow_mut() += 1)
            .unwrap();
        assert_eq!(bus.subscriber_count(Channel::Pause), 1);

        bus.publish(&MatchEvent::Resumed);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&MatchEvent::Resumed);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_unknown_channel_name_is_rejected() {
        let mut bus = EventBus::new();
        assert!(bus.subscribe_named("Nope", 0, |_| {}).is_none());
    }

    #[test]
    fn test_vec_sink_records() {
        let mut sink: Vec<MatchEvent> = Vec::new();
        sink.publish(&MatchEvent::MatchStarted);
        sink.publish(&MatchEvent::StonesSettled);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].channel(), Channel::Stone);
    }
}
