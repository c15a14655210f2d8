//! Fixed-capacity named storage slots
//!
//! The host exposes a handful of named regions of persisted text (the
//! original deployment target caps each near 100 KB). [`SlotStore`] is the
//! seam a host implements; [`MemorySlots`] is the in-process implementation
//! used by string-surfacing hosts and by tests. The engine is single-
//! threaded and cooperative, so a shared `Rc` handle is sufficient.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named checkpoint slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    /// The policy blob: table-or-population plus hyperparameters.
    Policy,
    /// Compact metrics summary, cleared after being taken.
    Metrics,
    /// Small always-resident status record.
    Status,
}

impl SlotId {
    pub fn name(self) -> &'static str {
        match self {
            SlotId::Policy => "policy",
            SlotId::Metrics => "metrics",
            SlotId::Status => "status",
        }
    }
}

/// Errors from checkpoint operations.
///
/// These surface only from save paths; loads never fail, they degrade to
/// defaults.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("slot {0} write failed: {1}")]
    SlotWrite(&'static str, String),

    #[error("blob exceeds slot budget after compaction: {size} > {budget} bytes")]
    OverBudget { size: usize, budget: usize },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CheckpointError {
    fn from(err: serde_json::Error) -> Self {
        CheckpointError::Serialization(err.to_string())
    }
}

/// Abstraction over the host's persisted slots.
pub trait SlotStore {
    /// Raw slot content, `None` when the slot has never been written.
    fn read(&self, slot: SlotId) -> Option<String>;

    /// Replace the slot content.
    fn write(&mut self, slot: SlotId, payload: &str) -> Result<(), CheckpointError>;

    /// Empty the slot, reclaiming its budget.
    fn clear(&mut self, slot: SlotId) -> Result<(), CheckpointError> {
        self.write(slot, "")
    }
}

/// In-memory slot store.
///
/// Cloned handles share the same underlying slots, so a host can keep one
/// handle and let the engine own another.
#[derive(Debug, Clone, Default)]
pub struct MemorySlots {
    inner: Rc<RefCell<HashMap<SlotId, String>>>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlots {
    fn read(&self, slot: SlotId) -> Option<String> {
        self.inner.borrow().get(&slot).cloned()
    }

    fn write(&mut self, slot: SlotId, payload: &str) -> Result<(), CheckpointError> {
        self.inner.borrow_mut().insert(slot, payload.to_string());
        Ok(())
    }
}
