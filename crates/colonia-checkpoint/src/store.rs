//! Budgeted save, validated load
//!
//! A slot may hold anything: a blob from this run, a blob from a prior
//! crashed run, a placeholder the host writes into untouched slots, or
//! garbage. Loads therefore validate before parsing and fall back to
//! freshly initialized defaults on any failure: corruption is a recoverable
//! event, logged and never raised to the caller.
//!
//! Metrics live in their own slot so a metrics-serialization issue cannot
//! corrupt the policy; taking the metrics summary clears the slot to stay
//! under budget.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::blob::{CheckpointBlob, Compactable, ControlFlags};
use crate::slot::{CheckpointError, SlotId, SlotStore};
use crate::{FORMAT_VERSION, SLOT_BYTE_BUDGET, STATUS_BYTE_BUDGET};

/// Per-slot byte budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub policy_budget: usize,
    pub metrics_budget: usize,
    pub status_budget: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            policy_budget: SLOT_BYTE_BUDGET,
            metrics_budget: SLOT_BYTE_BUDGET,
            status_budget: STATUS_BYTE_BUDGET,
        }
    }
}

/// Checkpoint facade over a [`SlotStore`].
pub struct CheckpointStore<S> {
    slots: S,
    config: CheckpointConfig,
    run_id: Uuid,
}

impl<S: SlotStore> CheckpointStore<S> {
    pub fn new(slots: S) -> Self {
        Self::with_config(slots, CheckpointConfig::default())
    }

    pub fn with_config(slots: S, config: CheckpointConfig) -> Self {
        CheckpointStore {
            slots,
            config,
            run_id: Uuid::now_v7(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Serialize the policy blob into the policy slot, shedding precision
    /// while the serialized form exceeds the slot budget. Returns the stored
    /// byte size.
    pub fn save_policy<P>(
        &mut self,
        control: &ControlFlags,
        policy: P,
    ) -> Result<usize, CheckpointError>
    where
        P: Serialize + Compactable,
    {
        let mut blob = CheckpointBlob {
            version: FORMAT_VERSION,
            run_id: self.run_id,
            saved_at: Utc::now().timestamp_millis(),
            control: *control,
            policy,
        };
        let mut payload = serde_json::to_string(&blob)?;
        while payload.len() > self.config.policy_budget {
            if !blob.policy.compact() {
                return Err(CheckpointError::OverBudget {
                    size: payload.len(),
                    budget: self.config.policy_budget,
                });
            }
            debug!(
                size = payload.len(),
                budget = self.config.policy_budget,
                "policy blob over budget, shedding precision"
            );
            payload = serde_json::to_string(&blob)?;
        }
        self.slots.write(SlotId::Policy, &payload)?;
        Ok(payload.len())
    }

    /// Load the policy blob, or a freshly initialized default when the slot
    /// is missing, a placeholder, or unparseable.
    pub fn load_policy<P>(&self) -> CheckpointBlob<P>
    where
        P: DeserializeOwned + Default,
    {
        match self.try_load::<P>(SlotId::Policy) {
            Ok(blob) => blob,
            Err(reason) => {
                warn!(
                    slot = SlotId::Policy.name(),
                    reason, "discarding stored blob, starting from defaults"
                );
                CheckpointBlob::fresh(self.run_id)
            }
        }
    }

    fn try_load<P: DeserializeOwned>(
        &self,
        slot: SlotId,
    ) -> Result<CheckpointBlob<P>, &'static str> {
        let raw = self.slots.read(slot).ok_or("missing slot")?;
        validate_raw(&raw)?;
        let blob: CheckpointBlob<P> =
            serde_json::from_str(&raw).map_err(|_| "parse failure")?;
        if blob.version != FORMAT_VERSION {
            return Err("format version mismatch");
        }
        Ok(blob)
    }

    /// Store a compact metrics summary in its own slot.
    pub fn save_metrics<M: Serialize>(&mut self, metrics: &M) -> Result<(), CheckpointError> {
        let payload = serde_json::to_string(metrics)?;
        if payload.len() > self.config.metrics_budget {
            return Err(CheckpointError::OverBudget {
                size: payload.len(),
                budget: self.config.metrics_budget,
            });
        }
        self.slots.write(SlotId::Metrics, &payload)
    }

    /// Read the metrics summary and clear the slot.
    pub fn take_metrics<M: DeserializeOwned>(&mut self) -> Option<M> {
        let raw = self.slots.read(SlotId::Metrics)?;
        let parsed = match validate_raw(&raw) {
            Ok(()) => serde_json::from_str(&raw)
                .map_err(|_| warn!(slot = SlotId::Metrics.name(), "unparseable metrics discarded"))
                .ok(),
            Err(_) => None,
        };
        if let Err(err) = self.slots.clear(SlotId::Metrics) {
            warn!(error = %err, "failed to clear metrics slot");
        }
        parsed
    }

    /// Persist the always-resident status record.
    pub fn save_status(&mut self, control: &ControlFlags) -> Result<(), CheckpointError> {
        let payload = serde_json::to_string(control)?;
        if payload.len() > self.config.status_budget {
            return Err(CheckpointError::OverBudget {
                size: payload.len(),
                budget: self.config.status_budget,
            });
        }
        self.slots.write(SlotId::Status, &payload)
    }

    /// Load the status record, defaulting on any failure.
    pub fn load_status(&self) -> ControlFlags {
        let Some(raw) = self.slots.read(SlotId::Status) else {
            return ControlFlags::default();
        };
        if validate_raw(&raw).is_err() {
            return ControlFlags::default();
        }
        serde_json::from_str(&raw).unwrap_or_else(|_| {
            warn!(slot = SlotId::Status.name(), "unparseable status record, using defaults");
            ControlFlags::default()
        })
    }
}

/// Reject content that is visibly not a blob before attempting to parse.
fn validate_raw(raw: &str) -> Result<(), &'static str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty slot");
    }
    if trimmed == "{}" || trimmed == "undefined" {
        return Err("placeholder content");
    }
    if !trimmed.starts_with('{') {
        return Err("not a JSON object");
    }
    Ok(())
}
