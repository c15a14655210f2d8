//! # Colonia Policy
//!
//! The adaptive decision-making engines: a tabular Q-learning agent
//! (one-step TD(0) and episodic Monte-Carlo variants, freeze-able for
//! evaluation) and a genetic-algorithm agent evolving complete
//! state→action lookup tables.
//!
//! Both engines sit behind the [`Agent`] capability interface; a
//! [`Strategy`] value selects which engine (and which learning variant)
//! a [`PolicyEngine`] dispatches to.

use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use colonia_common::{Action, WorldState};

pub mod evolution;
pub mod qlearning;
pub mod qtable;
pub mod schedule;
pub mod snapshot;

pub use evolution::{Chromosome, EvolutionAgent, EvolutionConfig};
pub use qlearning::{LearningMode, LearningStats, QLearningAgent, QLearningConfig};
pub use qtable::QTable;
pub use schedule::EpsilonSchedule;
pub use snapshot::PolicySnapshot;

/// Learning strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Q-learning with immediate one-step TD(0) updates.
    OneStepTd,
    /// Q-learning with episodic Monte-Carlo updates.
    MonteCarlo,
    /// Evolutionary search over complete policy tables.
    Evolution,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "td" | "one_step_td" | "one-step-td" => Ok(Strategy::OneStepTd),
            "mc" | "monte_carlo" | "monte-carlo" => Ok(Strategy::MonteCarlo),
            "ga" | "evolution" => Ok(Strategy::Evolution),
            other => Err(format!("unknown strategy: {other}")),
        }
    }
}

/// Reward signals computed by the runtime each tick.
///
/// The shaped reward drives Q-learning; the raw goal-progress delta drives
/// evolutionary fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardSignal {
    pub shaped: f64,
    pub progress_delta: f64,
}

/// What a completed learning step reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearnSummary {
    pub episodes: u64,
    pub avg_reward: f64,
    pub epsilon: f64,
    pub table_size: usize,
}

/// Per-trial summary returned by [`Agent::finalize_trial`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialReport {
    pub fitness: f64,
    pub generation_advanced: bool,
}

/// Aggregate engine statistics for logs and metrics summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "engine", rename_all = "snake_case")]
pub enum AgentStats {
    QLearning {
        episodes: u64,
        avg_reward: f64,
        epsilon: f64,
        table_size: usize,
        episode_step: usize,
    },
    Evolution {
        generation: u32,
        individual: usize,
        population_size: usize,
        trial_reward: f64,
        best_fitness: f64,
    },
}

/// Capability interface every policy engine implements.
///
/// The per-tick protocol is: `maybe_learn` (completes the previous tick's
/// transition), `act`, then `record_outcome` once the reward is known.
/// `finalize_trial` fires exactly once per epoch, at the trial boundary.
pub trait Agent {
    /// Choose an action for the state. An empty action list means "no legal
    /// action": engines return [`Action::Wait`].
    fn act(&mut self, state: &WorldState, actions: &[Action]) -> Action;

    /// Record this tick's decision and its observed reward signals.
    fn record_outcome(&mut self, state: &WorldState, action: &Action, signal: RewardSignal);

    /// Run whatever learning step is due, if any.
    fn maybe_learn(
        &mut self,
        next_state: &WorldState,
        next_actions: &[Action],
    ) -> Option<LearnSummary>;

    /// Close out the current trial and return its score.
    fn finalize_trial(&mut self, goal_reached: bool) -> TrialReport;

    /// Toggle evaluation mode: greedy policy, no learning updates.
    fn set_frozen(&mut self, frozen: bool);

    /// Serializable policy state for checkpointing.
    fn snapshot(&self) -> PolicySnapshot;

    /// Adopt a previously checkpointed policy state. A snapshot produced by
    /// a different engine leaves the freshly initialized state in place.
    fn restore(&mut self, snapshot: PolicySnapshot);

    fn stats(&self) -> AgentStats;
}

/// Strategy-selected policy engine.
pub enum PolicyEngine {
    QLearning(QLearningAgent),
    Evolution(EvolutionAgent),
}

impl PolicyEngine {
    pub fn new(
        strategy: Strategy,
        qlearning: QLearningConfig,
        evolution: EvolutionConfig,
        rng: StdRng,
    ) -> Self {
        match strategy {
            Strategy::OneStepTd => {
                PolicyEngine::QLearning(QLearningAgent::new(qlearning, LearningMode::OneStep, rng))
            }
            Strategy::MonteCarlo => {
                PolicyEngine::QLearning(QLearningAgent::new(qlearning, LearningMode::Episodic, rng))
            }
            Strategy::Evolution => {
                PolicyEngine::Evolution(EvolutionAgent::new(evolution, rng))
            }
        }
    }
}

impl Agent for PolicyEngine {
    fn act(&mut self, state: &WorldState, actions: &[Action]) -> Action {
        match self {
            PolicyEngine::QLearning(agent) => agent.act(state, actions),
            PolicyEngine::Evolution(agent) => agent.act(state, actions),
        }
    }

    fn record_outcome(&mut self, state: &WorldState, action: &Action, signal: RewardSignal) {
        match self {
            PolicyEngine::QLearning(agent) => agent.record_outcome(state, action, signal),
            PolicyEngine::Evolution(agent) => agent.record_outcome(state, action, signal),
        }
    }

    fn maybe_learn(
        &mut self,
        next_state: &WorldState,
        next_actions: &[Action],
    ) -> Option<LearnSummary> {
        match self {
            PolicyEngine::QLearning(agent) => agent.maybe_learn(next_state, next_actions),
            PolicyEngine::Evolution(agent) => agent.maybe_learn(next_state, next_actions),
        }
    }

    fn finalize_trial(&mut self, goal_reached: bool) -> TrialReport {
        match self {
            PolicyEngine::QLearning(agent) => agent.finalize_trial(goal_reached),
            PolicyEngine::Evolution(agent) => agent.finalize_trial(goal_reached),
        }
    }

    fn set_frozen(&mut self, frozen: bool) {
        match self {
            PolicyEngine::QLearning(agent) => agent.set_frozen(frozen),
            PolicyEngine::Evolution(agent) => agent.set_frozen(frozen),
        }
    }

    fn snapshot(&self) -> PolicySnapshot {
        match self {
            PolicyEngine::QLearning(agent) => agent.snapshot(),
            PolicyEngine::Evolution(agent) => agent.snapshot(),
        }
    }

    fn restore(&mut self, snapshot: PolicySnapshot) {
        match self {
            PolicyEngine::QLearning(agent) => agent.restore(snapshot),
            PolicyEngine::Evolution(agent) => agent.restore(snapshot),
        }
    }

    fn stats(&self) -> AgentStats {
        match self {
            PolicyEngine::QLearning(agent) => agent.stats(),
            PolicyEngine::Evolution(agent) => agent.stats(),
        }
    }
}
