//! # Colonia Common
//!
//! Shared types, errors, and encodings for the Colonia spawn-control engine.
//!
//! ## Core Types
//!
//! - [`Observation`]: per-tick snapshot reported by the world collaborator
//! - [`WorldState`]: bounded discrete state key derived from an observation
//! - [`Action`]: `Wait` or `Spawn { role, body }` decision value
//! - [`BodyShape`]: ordered, length-bounded worker part composition
//! - [`SpawnRequest`]/[`EffectReport`]: the action-effect boundary
//!
//! ## Encodings
//!
//! - [`types::state`]: observation → discrete state, full-domain enumeration
//! - [`catalog`]: deterministic legal-action generation and the
//!   level-independent action alphabet

pub mod catalog;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ColoniaError, Result};
pub use types::{
    action::{Action, BodyPart, BodyShape, Role},
    effect::{EffectReport, SpawnOutcome, SpawnRequest},
    observation::{Observation, RoleCounts},
    state::{EnergyBucket, StateKey, WorldState},
};

/// Colonia version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Energy cost of the basic worker body (one work, one carry, one move part).
pub const BASIC_BODY_COST: u32 = 200;

/// Per-role worker counts are clamped to this value in the encoded state.
pub const ROLE_COUNT_CAP: u8 = 3;

/// Goal levels are clamped to this value in the encoded state.
pub const GOAL_LEVEL_CAP: u8 = 3;

/// Goal level the world returns to after an external reset.
pub const BASELINE_GOAL_LEVEL: u8 = 1;

/// Number of extra parts appended to the basic body in extended shapes.
pub const BODY_EXTRA_PARTS: usize = 2;

/// Reward attributed to the decision that produced a malformed worker.
pub const MALFORMED_WORKER_PENALTY: f64 = -50.0;
