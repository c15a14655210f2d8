//! Freeze-able tabular Q-learning
//!
//! One agent covers both learning variants: immediate one-step TD(0)
//! updates, and an episodic path that buffers `(state, action, reward)`
//! steps and back-propagates full Monte-Carlo returns once the horizon is
//! reached. In frozen (evaluation) mode the policy is greedy and no update
//! touches the table.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use colonia_common::{Action, WorldState};

use crate::qtable::QTable;
use crate::schedule::EpsilonSchedule;
use crate::snapshot::PolicySnapshot;
use crate::{Agent, AgentStats, LearnSummary, RewardSignal, TrialReport};

/// Which update rule the agent applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    /// TD(0): bootstrap off the next state's estimated value every tick.
    OneStep,
    /// Monte-Carlo: learn from full discounted returns at episode end.
    Episodic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningConfig {
    pub alpha: f64,
    pub gamma: f64,
    /// Initial exploration probability.
    pub epsilon: f64,
    pub schedule: EpsilonSchedule,
    /// Steps per episode for the Monte-Carlo path.
    pub episode_length: usize,
    /// Episodes kept in the moving reward average.
    pub reward_window: usize,
    /// Construct the agent already in evaluation mode.
    pub frozen: bool,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.2,
            gamma: 0.9,
            epsilon: 0.3,
            schedule: EpsilonSchedule::WarmupGated {
                warmup: 4,
                decay: 0.995,
                floor: 0.05,
            },
            episode_length: 100,
            reward_window: 20,
            frozen: false,
        }
    }
}

/// Episode counters and the moving reward average.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningStats {
    pub episodes: u64,
    pub recent_rewards: VecDeque<f64>,
    pub avg_reward: f64,
}

impl LearningStats {
    fn record_episode(&mut self, total: f64, window: usize) {
        self.episodes += 1;
        self.recent_rewards.push_back(total);
        while self.recent_rewards.len() > window.max(1) {
            self.recent_rewards.pop_front();
        }
        self.avg_reward =
            self.recent_rewards.iter().sum::<f64>() / self.recent_rewards.len() as f64;
    }
}

#[derive(Debug, Clone)]
struct EpisodeStep {
    state: WorldState,
    action: Action,
    reward: f64,
}

#[derive(Debug, Clone)]
struct PendingTransition {
    state: WorldState,
    action: Action,
    reward: f64,
}

pub struct QLearningAgent {
    table: QTable,
    config: QLearningConfig,
    mode: LearningMode,
    epsilon: f64,
    frozen: bool,
    episode: Vec<EpisodeStep>,
    episode_reward: f64,
    pending: Option<PendingTransition>,
    stats: LearningStats,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(config: QLearningConfig, mode: LearningMode, rng: StdRng) -> Self {
        QLearningAgent {
            table: QTable::default(),
            epsilon: config.epsilon,
            frozen: config.frozen,
            mode,
            episode: Vec::new(),
            episode_reward: 0.0,
            pending: None,
            stats: LearningStats::default(),
            rng,
            config,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Epsilon-greedy selection. Frozen agents never explore; value ties
    /// break toward the first enumerated action, so an untrained all-zero
    /// table yields a reproducible choice.
    pub fn choose(&mut self, state: &WorldState, actions: &[Action]) -> Action {
        if actions.is_empty() {
            return Action::Wait;
        }
        let explore = if self.frozen { 0.0 } else { self.epsilon };
        if self.rng.gen::<f64>() < explore {
            return actions[self.rng.gen_range(0..actions.len())].clone();
        }

        let mut best = &actions[0];
        let mut best_q = f64::NEG_INFINITY;
        for action in actions {
            let q = self.table.get(state, action);
            if q > best_q {
                best_q = q;
                best = action;
            }
        }
        best.clone()
    }

    /// One-step TD(0) update:
    /// `Q(s,a) ← (1-α)·Q(s,a) + α·(r + γ·max_{a'} Q(s',a'))`.
    pub fn learn(
        &mut self,
        state: &WorldState,
        action: &Action,
        reward: f64,
        next_state: &WorldState,
        next_actions: &[Action],
    ) {
        if self.frozen {
            return;
        }
        let q = self.table.get(state, action);
        let next_best = self.table.max_over(next_state, next_actions);
        let updated =
            (1.0 - self.config.alpha) * q + self.config.alpha * (reward + self.config.gamma * next_best);
        self.table.set(state, action, updated);
        self.epsilon = self.config.schedule.next(self.epsilon, self.stats.episodes);
    }

    /// Append one step to the episode buffer; true once the configured
    /// horizon is reached.
    pub fn record_step(&mut self, state: &WorldState, action: &Action, reward: f64) -> bool {
        self.episode.push(EpisodeStep {
            state: *state,
            action: action.clone(),
            reward,
        });
        self.episode_reward += reward;
        self.episode.len() >= self.config.episode_length
    }

    /// Monte-Carlo update over the buffered episode. Returns are computed
    /// walking the buffer backward from the terminal step
    /// (`G_t = r_t + γ·G_{t+1}`) and every visited pair moves toward its own
    /// return: a full-return target, not a one-step bootstrap. The buffer is
    /// consumed either way; frozen agents update nothing.
    pub fn learn_episode(&mut self) -> LearnSummary {
        if self.frozen {
            self.reset_episode();
            return self.summary();
        }

        let mut g = 0.0;
        for step in self.episode.iter().rev() {
            g = self.config.gamma * g + step.reward;
            let q = self.table.get(&step.state, &step.action);
            self.table
                .set(&step.state, &step.action, q + self.config.alpha * (g - q));
        }

        let total = self.episode_reward;
        self.stats.record_episode(total, self.config.reward_window);
        self.epsilon = self.config.schedule.next(self.epsilon, self.stats.episodes);
        self.reset_episode();

        let summary = self.summary();
        debug!(
            episode = summary.episodes,
            avg_reward = summary.avg_reward,
            epsilon = summary.epsilon,
            q_size = summary.table_size,
            "episode learned"
        );
        summary
    }

    pub fn reset_episode(&mut self) {
        self.episode.clear();
        self.episode_reward = 0.0;
    }

    fn summary(&self) -> LearnSummary {
        LearnSummary {
            episodes: self.stats.episodes,
            avg_reward: self.stats.avg_reward,
            epsilon: self.epsilon,
            table_size: self.table.len(),
        }
    }
}

impl Agent for QLearningAgent {
    fn act(&mut self, state: &WorldState, actions: &[Action]) -> Action {
        self.choose(state, actions)
    }

    fn record_outcome(&mut self, state: &WorldState, action: &Action, signal: RewardSignal) {
        match self.mode {
            LearningMode::Episodic => {
                self.record_step(state, action, signal.shaped);
            }
            LearningMode::OneStep => {
                self.pending = Some(PendingTransition {
                    state: *state,
                    action: action.clone(),
                    reward: signal.shaped,
                });
            }
        }
    }

    fn maybe_learn(
        &mut self,
        next_state: &WorldState,
        next_actions: &[Action],
    ) -> Option<LearnSummary> {
        match self.mode {
            LearningMode::OneStep => {
                if let Some(pending) = self.pending.take() {
                    self.learn(
                        &pending.state,
                        &pending.action,
                        pending.reward,
                        next_state,
                        next_actions,
                    );
                }
                None
            }
            LearningMode::Episodic => (self.episode.len() >= self.config.episode_length)
                .then(|| self.learn_episode()),
        }
    }

    fn finalize_trial(&mut self, goal_reached: bool) -> TrialReport {
        // A trial boundary truncates any in-flight transition.
        self.pending = None;
        if !self.episode.is_empty() {
            let summary = self.learn_episode();
            debug!(
                goal_reached,
                episodes = summary.episodes,
                "flushed partial episode at trial end"
            );
        }
        TrialReport {
            fitness: self.stats.avg_reward,
            generation_advanced: false,
        }
    }

    fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::QLearning {
            table: self.table.as_map().clone(),
            epsilon: self.epsilon,
            episodes: self.stats.episodes,
            avg_reward: self.stats.avg_reward,
            recent_rewards: self.stats.recent_rewards.iter().copied().collect(),
        }
    }

    fn restore(&mut self, snapshot: PolicySnapshot) {
        match snapshot {
            PolicySnapshot::QLearning {
                table,
                epsilon,
                episodes,
                avg_reward,
                recent_rewards,
            } => {
                self.table = QTable::from_map(table);
                // A blank snapshot is a fresh start: keep the configured
                // exploration rate instead of the stored one.
                self.epsilon = if episodes == 0 && self.table.is_empty() {
                    self.config.epsilon
                } else {
                    epsilon.clamp(0.0, 1.0)
                };
                self.stats = LearningStats {
                    episodes,
                    avg_reward,
                    recent_rewards: recent_rewards.into_iter().collect(),
                };
                self.pending = None;
                self.reset_episode();
            }
            PolicySnapshot::Evolution { .. } => {
                warn!("snapshot holds a population, not a table; keeping fresh state");
            }
        }
    }

    fn stats(&self) -> AgentStats {
        AgentStats::QLearning {
            episodes: self.stats.episodes,
            avg_reward: self.stats.avg_reward,
            epsilon: self.epsilon,
            table_size: self.table.len(),
            episode_step: self.episode.len(),
        }
    }
}
