//! Serializable policy state
//!
//! A [`PolicySnapshot`] is the `policyState` half of a checkpoint blob:
//! either a Q-table with its hyperparameter remnants, or a population with
//! its fitness array and bookkeeping indices. The default snapshot is a
//! blank Q-learning table, which is what a loader falls back to when a
//! stored blob cannot be trusted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use colonia_checkpoint::Compactable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum PolicySnapshot {
    QLearning {
        table: BTreeMap<String, f64>,
        epsilon: f64,
        episodes: u64,
        avg_reward: f64,
        recent_rewards: Vec<f64>,
    },
    Evolution {
        genes: Vec<Vec<u8>>,
        fitness: Vec<f64>,
        individual: usize,
        generation: u32,
    },
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        PolicySnapshot::QLearning {
            table: BTreeMap::new(),
            epsilon: 0.0,
            episodes: 0,
            avg_reward: 0.0,
            recent_rewards: Vec::new(),
        }
    }
}

impl Compactable for PolicySnapshot {
    /// Shed precision instead of failing a save: drop the half of the
    /// Q-table with the smallest magnitudes. Population snapshots are
    /// bounded by construction and have nothing to shed.
    fn compact(&mut self) -> bool {
        match self {
            PolicySnapshot::QLearning { table, .. } => {
                if table.len() <= 1 {
                    return false;
                }
                let mut entries: Vec<(String, f64)> = std::mem::take(table).into_iter().collect();
                entries.sort_by(|a, b| {
                    b.1.abs()
                        .partial_cmp(&a.1.abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                entries.truncate(entries.len() / 2);
                *table = entries.into_iter().collect();
                true
            }
            PolicySnapshot::Evolution { .. } => false,
        }
    }
}
