//! Action-effect boundary types
//!
//! The engine emits at most one [`SpawnRequest`] per tick; the world
//! collaborator applies it and reports back an [`EffectReport`]. An
//! insufficient-resource or busy outcome is not an error: the action simply
//! no-ops and reward shaping penalizes it on the next learning update.

use serde::{Deserialize, Serialize};

use super::action::{BodyShape, Role};

/// Worker-creation request handed to the world collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub role: Role,
    pub body: BodyShape,
}

impl SpawnRequest {
    /// Request for a basic-bodied worker of the given role.
    pub fn basic(role: Role) -> Self {
        SpawnRequest {
            role,
            body: BodyShape::basic(),
        }
    }
}

/// Collaborator verdict on a spawn request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnOutcome {
    Spawned,
    InsufficientResources,
    Busy,
}

/// What the collaborator did with this tick's request.
///
/// `malformed_workers` counts units removed this tick for lacking required
/// capability parts; the engine attributes a strong negative reward to the
/// decision that produced them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectReport {
    pub spawn: Option<SpawnOutcome>,
    pub malformed_workers: u16,
}
