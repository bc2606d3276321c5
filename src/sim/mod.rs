//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Host-supplied clock only (no wall time)
//! - Seeded RNG only
//! - Stable iteration order (insertion order per entity set)
//! - No rendering or platform dependencies

pub mod ammo;
pub mod collision;
pub mod events;
pub mod kinematics;
pub mod powerups;
pub mod registry;
pub mod scoring;
pub mod session;
pub mod state;
pub mod tick;
pub mod wave;

pub use ammo::{AmmoState, FireOutcome};
pub use collision::{Aabb, ShotHit, overlapping, resolve_shots};
pub use events::{EventBus, EventKind, EventSink, GameEvent};
pub use kinematics::MoveIntent;
pub use powerups::{BuffKind, Buffs};
pub use registry::{EntityRegistry, EntitySet};
pub use scoring::{Award, ScoringEngine};
pub use session::{DamageOutcome, Session};
pub use state::{
    AsteroidSize, Entity, EntityId, EntityKind, GameState, HazardKind, Owner, Player, PowerUpKind,
};
pub use tick::TickInput;
pub use wave::{DirectorEvent, SpawnRequest, WaveDirector, WavePhase, WaveStats, WaveSummary};
