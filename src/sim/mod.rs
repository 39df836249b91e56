//! Deterministic match simulation
//!
//! All rules logic lives here. This module must be pure and deterministic:
//! - Advanced only by the host's fixed-timestep `tick`
//! - No timers, loops or platform dependencies
//! - Stable iteration order (by stone ID)

pub mod collision;
pub mod events;
pub mod machine;
pub mod power;
pub mod scoring;
pub mod state;
pub mod tick;

pub use collision::{ContactOutcome, ContactResponse, resolve_contact};
pub use events::{Channel, EventBus, EventSink, MatchEvent, NullSink, SubscriptionId};
pub use machine::MatchStateMachine;
pub use power::{PowerUpKind, TeamBanks, TeamPowerBank};
pub use scoring::{EndScore, score_end};
pub use state::{EndResult, GamePhase, MatchOutcome, MatchState, Scores, Stone, Team};
pub use tick::{Contact, LaunchCommand, StoneSample, TickInput};
