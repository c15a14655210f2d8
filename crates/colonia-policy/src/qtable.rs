//! Tabular action-value storage
//!
//! Keys are the canonical `"{state}|{action}"` strings, so a table
//! serializes directly into a checkpoint blob. Absent entries default to
//! zero; the table grows monotonically within an agent's lifetime and is
//! reset wholesale only on explicit agent reset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use colonia_common::{Action, WorldState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    entries: BTreeMap<String, f64>,
}

impl QTable {
    /// Composite key for a `(state, action)` pair.
    pub fn key(state: &WorldState, action: &Action) -> String {
        format!("{}|{}", state.key(), action)
    }

    /// Stored value, defaulting to zero.
    pub fn get(&self, state: &WorldState, action: &Action) -> f64 {
        self.entries.get(&Self::key(state, action)).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, state: &WorldState, action: &Action, value: f64) {
        self.entries.insert(Self::key(state, action), value);
    }

    /// Best stored value over the given actions; zero for an empty list.
    pub fn max_over(&self, state: &WorldState, actions: &[Action]) -> f64 {
        if actions.is_empty() {
            return 0.0;
        }
        actions
            .iter()
            .map(|a| self.get(state, a))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.entries
    }

    pub fn from_map(entries: BTreeMap<String, f64>) -> Self {
        QTable { entries }
    }
}
