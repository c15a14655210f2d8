//! Aggregate runtime configuration
//!
//! Defaults mirror the tuned hyperparameters the engine ships with;
//! `COLONIA_*` environment variables (optionally via a `.env` file) override
//! individual knobs without touching the rest.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use colonia_checkpoint::CheckpointConfig;
use colonia_policy::{EpsilonSchedule, EvolutionConfig, QLearningConfig, Strategy};

use crate::controller::EpochConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub strategy: Strategy,
    pub qlearning: QLearningConfig,
    pub evolution: EvolutionConfig,
    pub epoch: EpochConfig,
    pub checkpoint: CheckpointConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::MonteCarlo,
            qlearning: QLearningConfig::default(),
            evolution: EvolutionConfig::default(),
            epoch: EpochConfig::default(),
            checkpoint: CheckpointConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        // Pick up a .env file when present
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        if let Ok(val) = std::env::var("COLONIA_STRATEGY") {
            if let Ok(v) = val.parse() {
                cfg.strategy = v;
            }
        }

        // Q-learning knobs
        if let Ok(val) = std::env::var("COLONIA_ALPHA") {
            if let Ok(v) = val.parse() {
                cfg.qlearning.alpha = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_GAMMA") {
            if let Ok(v) = val.parse() {
                cfg.qlearning.gamma = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_EPSILON") {
            if let Ok(v) = val.parse() {
                cfg.qlearning.epsilon = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_EPISODE_LENGTH") {
            if let Ok(v) = val.parse() {
                cfg.qlearning.episode_length = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_EVAL") {
            cfg.qlearning.frozen = matches!(val.as_str(), "1" | "true");
        }
        if let EpsilonSchedule::WarmupGated {
            warmup,
            decay,
            floor,
        } = &mut cfg.qlearning.schedule
        {
            if let Ok(val) = std::env::var("COLONIA_EPSILON_DECAY") {
                if let Ok(v) = val.parse() {
                    *decay = v;
                }
            }
            if let Ok(val) = std::env::var("COLONIA_MIN_EPSILON") {
                if let Ok(v) = val.parse() {
                    *floor = v;
                }
            }
            if let Ok(val) = std::env::var("COLONIA_WARMUP_EPISODES") {
                if let Ok(v) = val.parse() {
                    *warmup = v;
                }
            }
        }

        // Evolution knobs
        if let Ok(val) = std::env::var("COLONIA_POPULATION_SIZE") {
            if let Ok(v) = val.parse() {
                cfg.evolution.population_size = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_CROSSOVER_RATE") {
            if let Ok(v) = val.parse() {
                cfg.evolution.crossover_rate = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_MUTATION_RATE") {
            if let Ok(v) = val.parse() {
                cfg.evolution.mutation_rate = v;
            }
        }

        // Epoch knobs
        if let Ok(val) = std::env::var("COLONIA_GOAL_LEVEL_TARGET") {
            if let Ok(v) = val.parse() {
                cfg.epoch.goal_level_target = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_TRIAL_TIMEOUT") {
            if let Ok(v) = val.parse() {
                cfg.epoch.trial_timeout_ticks = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_CHECKPOINT_INTERVAL") {
            if let Ok(v) = val.parse() {
                cfg.epoch.checkpoint_interval = v;
            }
        }
        if let Ok(val) = std::env::var("COLONIA_PAUSE_BETWEEN_TRIALS") {
            cfg.epoch.pause_between_trials = matches!(val.as_str(), "1" | "true");
        }

        Ok(cfg)
    }
}
