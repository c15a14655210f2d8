//! Exploration-decay schedules
//!
//! The decay applied to epsilon after a learning step is one configurable
//! policy rather than a hardcoded formula. All variants clamp at a floor so
//! a long-lived agent keeps a residual exploration rate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpsilonSchedule {
    /// `ε ← max(floor, ε·decay)` after every learning step.
    Multiplicative { decay: f64, floor: f64 },
    /// `ε = floor + (start − floor)·exp(−rate·episodes)`.
    ExponentialEpisodes { start: f64, rate: f64, floor: f64 },
    /// Multiplicative decay gated until `warmup` episodes have completed.
    WarmupGated { warmup: u64, decay: f64, floor: f64 },
}

impl EpsilonSchedule {
    /// The epsilon to use after a learning step, given the current value and
    /// the number of completed episodes.
    pub fn next(&self, current: f64, completed_episodes: u64) -> f64 {
        match *self {
            EpsilonSchedule::Multiplicative { decay, floor } => (current * decay).max(floor),
            EpsilonSchedule::ExponentialEpisodes { start, rate, floor } => {
                floor + (start - floor) * (-rate * completed_episodes as f64).exp()
            }
            EpsilonSchedule::WarmupGated { warmup, decay, floor } => {
                if completed_episodes > warmup {
                    (current * decay).max(floor)
                } else {
                    current
                }
            }
        }
    }
}
