//! Versioned checkpoint envelope

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Paused/evaluating flags and trial bookkeeping.
///
/// Doubles as the always-resident status record: a copy lives in the small
/// status slot and another inside every policy blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFlags {
    /// Trial finished; awaiting an external world reset.
    pub paused: bool,
    /// Evaluation mode: greedy policy, no learning updates.
    pub evaluating: bool,
    /// Evolutionary generation counter.
    pub generation: u32,
    /// Index of the individual under evaluation.
    pub individual: usize,
    /// Goal level last observed before the save.
    pub last_goal_level: u8,
}

/// Serialized snapshot of one agent: policy state plus control flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointBlob<P> {
    pub version: u32,
    pub run_id: Uuid,
    /// Unix milliseconds at save time.
    pub saved_at: i64,
    pub control: ControlFlags,
    pub policy: P,
}

impl<P: Default> CheckpointBlob<P> {
    /// Freshly initialized envelope, used whenever a stored blob cannot be
    /// trusted.
    pub fn fresh(run_id: Uuid) -> Self {
        CheckpointBlob {
            version: crate::FORMAT_VERSION,
            run_id,
            saved_at: Utc::now().timestamp_millis(),
            control: ControlFlags::default(),
            policy: P::default(),
        }
    }
}

/// Precision-shedding hook for payloads that exceed their slot budget.
///
/// `compact` drops the least valuable portion of the payload and returns
/// whether anything was actually shed; the store calls it repeatedly until
/// the serialized form fits or no further shedding is possible.
pub trait Compactable {
    fn compact(&mut self) -> bool;
}
