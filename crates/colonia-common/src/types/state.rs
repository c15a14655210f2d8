//! Discrete world-state encoding
//!
//! [`WorldState::encode`] is a pure, total function from an observation to a
//! bounded discrete key: the same observation always yields the same state,
//! and the full domain is small enough to enumerate, so the evolutionary
//! agent can keep one gene per state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::observation::Observation;
use crate::{BASELINE_GOAL_LEVEL, BASIC_BODY_COST, GOAL_LEVEL_CAP, ROLE_COUNT_CAP};

/// Resource-availability bucket: can the colony afford a basic body?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyBucket {
    Low,
    Ready,
}

impl EnergyBucket {
    fn bit(self) -> u8 {
        match self {
            EnergyBucket::Low => 0,
            EnergyBucket::Ready => 1,
        }
    }
}

/// Bounded discrete world state, the domain of every policy table.
///
/// Worker counts are clamped to [`ROLE_COUNT_CAP`] and the goal level to
/// `1..=GOAL_LEVEL_CAP`, so the domain has exactly [`WorldState::DOMAIN_SIZE`]
/// members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldState {
    pub energy: EnergyBucket,
    pub harvesters: u8,
    pub upgraders: u8,
    pub builders: u8,
    pub goal_level: u8,
}

impl WorldState {
    /// Total number of distinct states.
    pub const DOMAIN_SIZE: usize =
        2 * (ROLE_COUNT_CAP as usize + 1).pow(3) * GOAL_LEVEL_CAP as usize;

    /// Deterministically encode an observation into a state.
    pub fn encode(obs: &Observation) -> Self {
        let clamp = |n: u16| (n.min(ROLE_COUNT_CAP as u16)) as u8;
        WorldState {
            energy: if obs.energy_available >= BASIC_BODY_COST {
                EnergyBucket::Ready
            } else {
                EnergyBucket::Low
            },
            harvesters: clamp(obs.workers.harvesters),
            upgraders: clamp(obs.workers.upgraders),
            builders: clamp(obs.workers.builders),
            goal_level: obs.goal_level.clamp(BASELINE_GOAL_LEVEL, GOAL_LEVEL_CAP),
        }
    }

    /// Canonical pipe-joined rendering, stable across versions.
    pub fn key(&self) -> StateKey {
        StateKey(format!(
            "{}|{}|{}|{}|{}",
            self.energy.bit(),
            self.harvesters,
            self.upgraders,
            self.builders,
            self.goal_level
        ))
    }

    /// Dense index into the enumerated domain, `0..DOMAIN_SIZE`.
    pub fn index(&self) -> usize {
        let counts = ROLE_COUNT_CAP as usize + 1;
        let mut idx = self.energy.bit() as usize;
        idx = idx * counts + self.harvesters as usize;
        idx = idx * counts + self.upgraders as usize;
        idx = idx * counts + self.builders as usize;
        idx * GOAL_LEVEL_CAP as usize + (self.goal_level - BASELINE_GOAL_LEVEL) as usize
    }

    /// Every state in the domain, in [`WorldState::index`] order.
    pub fn enumerate() -> Vec<WorldState> {
        let mut states = Vec::with_capacity(Self::DOMAIN_SIZE);
        for energy in [EnergyBucket::Low, EnergyBucket::Ready] {
            for harvesters in 0..=ROLE_COUNT_CAP {
                for upgraders in 0..=ROLE_COUNT_CAP {
                    for builders in 0..=ROLE_COUNT_CAP {
                        for goal_level in BASELINE_GOAL_LEVEL..=GOAL_LEVEL_CAP {
                            states.push(WorldState {
                                energy,
                                harvesters,
                                upgraders,
                                builders,
                                goal_level,
                            });
                        }
                    }
                }
            }
        }
        states
    }
}

/// Canonical string form of a [`WorldState`], used in Q-table keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
