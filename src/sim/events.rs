//! Typed notifications for hosts (HUD, audio, effects)
//!
//! Fire-and-forget: the session pushes events and never reads anything back.
//! Push consumers register an [`EventSink`], optionally filtered to a set of
//! [`EventKind`]s; pull consumers drain the bounded outbox.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::powerups::BuffKind;
use super::state::{EntityId, HazardKind, PowerUpKind};
use super::wave::WaveSummary;

/// Outbox capacity; the oldest events are dropped beyond it
pub const OUTBOX_CAPACITY: usize = 4096;

/// Everything the simulation tells the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Lives { lives: u8 },
    Score { score: u64, delta: u64 },
    /// 1-based wave number
    Wave { wave: u32 },
    WaveIntro { wave: u32, total: u32 },
    WaveProgress { progress: f32 },
    Kills { saucers: u32, stingers: u32, asteroids: u32 },
    AmmoArc { ratio: f32, reloading: bool },
    Combo { level: u32 },
    Streak { level: u32, multiplier: f64 },
    BuffStarted { buff: BuffKind, duration_ms: f64 },
    BuffProgress { buff: BuffKind, remaining: f32 },
    BuffExpired { buff: BuffKind },
    PlayerHit { lives: u8 },
    ShieldBlocked,
    PowerUpCollected { kind: PowerUpKind },
    /// A hazard entered from off-screen at this height
    ThreatIncoming { kind: HazardKind, y: f32 },
    Explosion { x: f32, y: f32, scale: f32 },
    Ripple { x: f32, y: f32 },
    StingerLocked { id: EntityId },
    EnemyFired { x: f32, y: f32 },
    WaveSummary(WaveSummary),
    /// Remaining enemies faded out at wave end
    HazardsCleared { count: u32 },
    Celebration,
    MissionComplete { score: u64, best: u64, is_new_best: bool },
    GameOver { final_score: u64, best: u64, is_new_best: bool },
}

/// Payload-free discriminant for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Lives,
    Score,
    Wave,
    WaveIntro,
    WaveProgress,
    Kills,
    AmmoArc,
    Combo,
    Streak,
    BuffStarted,
    BuffProgress,
    BuffExpired,
    PlayerHit,
    ShieldBlocked,
    PowerUpCollected,
    ThreatIncoming,
    Explosion,
    Ripple,
    StingerLocked,
    EnemyFired,
    WaveSummary,
    HazardsCleared,
    Celebration,
    MissionComplete,
    GameOver,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::Lives { .. } => EventKind::Lives,
            GameEvent::Score { .. } => EventKind::Score,
            GameEvent::Wave { .. } => EventKind::Wave,
            GameEvent::WaveIntro { .. } => EventKind::WaveIntro,
            GameEvent::WaveProgress { .. } => EventKind::WaveProgress,
            GameEvent::Kills { .. } => EventKind::Kills,
            GameEvent::AmmoArc { .. } => EventKind::AmmoArc,
            GameEvent::Combo { .. } => EventKind::Combo,
            GameEvent::Streak { .. } => EventKind::Streak,
            GameEvent::BuffStarted { .. } => EventKind::BuffStarted,
            GameEvent::BuffProgress { .. } => EventKind::BuffProgress,
            GameEvent::BuffExpired { .. } => EventKind::BuffExpired,
            GameEvent::PlayerHit { .. } => EventKind::PlayerHit,
            GameEvent::ShieldBlocked => EventKind::ShieldBlocked,
            GameEvent::PowerUpCollected { .. } => EventKind::PowerUpCollected,
            GameEvent::ThreatIncoming { .. } => EventKind::ThreatIncoming,
            GameEvent::Explosion { .. } => EventKind::Explosion,
            GameEvent::Ripple { .. } => EventKind::Ripple,
            GameEvent::StingerLocked { .. } => EventKind::StingerLocked,
            GameEvent::EnemyFired { .. } => EventKind::EnemyFired,
            GameEvent::WaveSummary(_) => EventKind::WaveSummary,
            GameEvent::HazardsCleared { .. } => EventKind::HazardsCleared,
            GameEvent::Celebration => EventKind::Celebration,
            GameEvent::MissionComplete { .. } => EventKind::MissionComplete,
            GameEvent::GameOver { .. } => EventKind::GameOver,
        }
    }
}

/// A push consumer of game events
pub trait EventSink {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EventSink for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}

struct Subscription {
    filter: Option<Vec<EventKind>>,
    sink: Box<dyn EventSink>,
}

impl Subscription {
    fn wants(&self, kind: EventKind) -> bool {
        self.filter.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Dispatch table plus pull outbox
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscription>,
    outbox: VecDeque<GameEvent>,
    dropped: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.outbox.len())
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event
    pub fn subscribe(&mut self, sink: Box<dyn EventSink>) {
        self.subscribers.push(Subscription { filter: None, sink });
    }

    /// Receive only the listed kinds
    pub fn subscribe_to(&mut self, kinds: &[EventKind], sink: Box<dyn EventSink>) {
        self.subscribers.push(Subscription {
            filter: Some(kinds.to_vec()),
            sink,
        });
    }

    pub fn emit(&mut self, event: GameEvent) {
        let kind = event.kind();
        for sub in self.subscribers.iter_mut().filter(|s| s.wants(kind)) {
            sub.sink.on_event(&event);
        }

        if self.outbox.len() >= OUTBOX_CAPACITY {
            self.outbox.pop_front();
            self.dropped += 1;
            if self.dropped == 1 {
                log::warn!("Event outbox full, dropping oldest events");
            }
        }
        self.outbox.push_back(event);
    }

    /// Take every queued event in emission order
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.outbox.drain(..).collect()
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Events lost to outbox overflow
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_drain_in_order() {
        let mut bus = EventBus::new();
        bus.emit(GameEvent::Lives { lives: 3 });
        bus.emit(GameEvent::Score { score: 50, delta: 50 });
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), EventKind::Lives);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_filtered_subscription() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut bus = EventBus::new();
        bus.subscribe_to(
            &[EventKind::Score],
            Box::new(move |e: &GameEvent| sink.borrow_mut().push(e.clone())),
        );

        bus.emit(GameEvent::Lives { lives: 2 });
        bus.emit(GameEvent::Score { score: 200, delta: 200 });

        assert_eq!(*seen.borrow(), vec![GameEvent::Score { score: 200, delta: 200 }]);
        // Outbox still has everything
        assert_eq!(bus.pending(), 2);
    }

    #[test]
    fn test_outbox_bounded() {
        let mut bus = EventBus::new();
        for i in 0..(OUTBOX_CAPACITY + 10) {
            bus.emit(GameEvent::Score {
                score: i as u64,
                delta: 0,
            });
        }
        assert_eq!(bus.pending(), OUTBOX_CAPACITY);
        assert_eq!(bus.dropped(), 10);
        let first = bus.drain().remove(0);
        assert_eq!(first, GameEvent::Score { score: 10, delta: 0 });
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&GameEvent::AmmoArc {
            ratio: 0.5,
            reloading: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"ammo_arc","ratio":0.5,"reloading":true}"#);
    }
}
