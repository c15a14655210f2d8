//! Trial-boundary state machine
//!
//! A trial runs until the goal level is reached or a tick-count timeout
//! elapses, finalizes exactly once, then holds until the external
//! collaborator reports the world back at its baseline. The GA variant may
//! additionally pause after every individual so a bad chromosome cannot run
//! unsupervised into the next trial.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use colonia_common::{Observation, BASELINE_GOAL_LEVEL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochConfig {
    /// Goal level that ends a trial as a success.
    pub goal_level_target: u8,
    /// Tick-count timeout that ends a trial regardless of progress.
    pub trial_timeout_ticks: u64,
    /// Require an external reset between individuals (GA variant).
    pub pause_between_trials: bool,
    /// Checkpoint the policy every this many ticks inside a trial.
    pub checkpoint_interval: u64,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            goal_level_target: 2,
            trial_timeout_ticks: 6000,
            pause_between_trials: false,
            checkpoint_interval: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Running,
    AwaitingReset,
    PausedAfterTrial,
}

/// Why the current trial ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialEnd {
    GoalReached,
    Timeout,
}

/// What the controller decided for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Trial in progress; decide and learn as usual.
    Continue,
    /// Trial boundary hit; finalize exactly once.
    Finalize(TrialEnd),
    /// Finalized; waiting for the external reset.
    Hold,
    /// The world is back at baseline; a fresh trial begins this tick.
    Resume,
}

/// Ticks at which goal levels were first reached this trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilestoneTracker {
    last_level: u8,
    pub reached: Vec<(u8, u64)>,
}

impl MilestoneTracker {
    fn begin(&mut self, level: u8) {
        self.last_level = level;
        self.reached.clear();
    }

    fn observe(&mut self, level: u8, tick: u64) {
        if level > self.last_level {
            info!(level, tick, "goal level reached");
            self.reached.push((level, tick));
            self.last_level = level;
        }
    }
}

pub struct EpochController {
    config: EpochConfig,
    phase: Phase,
    trial_ticks: u64,
    epochs_completed: u64,
    force_end: bool,
    milestones: MilestoneTracker,
}

impl EpochController {
    pub fn new(config: EpochConfig) -> Self {
        EpochController {
            config,
            phase: Phase::Running,
            trial_ticks: 0,
            epochs_completed: 0,
            force_end: false,
            milestones: MilestoneTracker {
                last_level: BASELINE_GOAL_LEVEL,
                reached: Vec::new(),
            },
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn trial_ticks(&self) -> u64 {
        self.trial_ticks
    }

    pub fn epochs_completed(&self) -> u64 {
        self.epochs_completed
    }

    pub fn milestones(&self) -> &MilestoneTracker {
        &self.milestones
    }

    /// Drive the state machine one tick.
    pub fn observe(&mut self, obs: &Observation) -> Verdict {
        match self.phase {
            Phase::Running => {
                self.trial_ticks += 1;
                self.milestones.observe(obs.goal_level, self.trial_ticks);
                if obs.goal_level >= self.config.goal_level_target {
                    Verdict::Finalize(TrialEnd::GoalReached)
                } else if self.force_end || self.trial_ticks >= self.config.trial_timeout_ticks {
                    Verdict::Finalize(TrialEnd::Timeout)
                } else {
                    Verdict::Continue
                }
            }
            Phase::AwaitingReset | Phase::PausedAfterTrial => {
                if obs.at_baseline() {
                    self.begin_trial(obs.goal_level);
                    Verdict::Resume
                } else {
                    Verdict::Hold
                }
            }
        }
    }

    /// Record that finalize ran. Until the external reset is observed,
    /// every subsequent tick holds.
    pub fn mark_finalized(&mut self) {
        self.force_end = false;
        self.epochs_completed += 1;
        self.hold_for_reset();
    }

    /// Enter the waiting phase without counting an epoch, for when a
    /// restored checkpoint says a finalize already happened.
    pub fn hold_for_reset(&mut self) {
        self.phase = if self.config.pause_between_trials {
            Phase::PausedAfterTrial
        } else {
            Phase::AwaitingReset
        };
    }

    /// External manual-reset request: end the running trial on the next tick.
    pub fn request_end(&mut self) {
        if self.phase == Phase::Running {
            self.force_end = true;
        }
    }

    pub fn should_checkpoint(&self) -> bool {
        self.config.checkpoint_interval > 0
            && self.trial_ticks % self.config.checkpoint_interval == 0
    }

    fn begin_trial(&mut self, level: u8) {
        debug!(epoch = self.epochs_completed, "trial started");
        self.phase = Phase::Running;
        self.trial_ticks = 0;
        self.milestones.begin(level);
    }
}

#[cfg(test)]
mod tests {
    use colonia_common::RoleCounts;

    use super::*;

    fn obs(level: u8, harvesters: u16, progress: u64) -> Observation {
        Observation {
            energy_available: 300,
            workers: RoleCounts {
                harvesters,
                upgraders: 0,
                builders: 0,
            },
            goal_progress: progress,
            goal_level: level,
            population_empty: harvesters == 0,
        }
    }

    #[test]
    fn test_goal_reached_finalizes() {
        let mut c = EpochController::new(EpochConfig::default());
        assert_eq!(c.observe(&obs(1, 1, 10)), Verdict::Continue);
        assert_eq!(c.observe(&obs(2, 1, 20)), Verdict::Finalize(TrialEnd::GoalReached));
    }

    #[test]
    fn test_timeout_finalizes() {
        let config = EpochConfig {
            trial_timeout_ticks: 3,
            ..Default::default()
        };
        let mut c = EpochController::new(config);
        assert_eq!(c.observe(&obs(1, 1, 0)), Verdict::Continue);
        assert_eq!(c.observe(&obs(1, 1, 0)), Verdict::Continue);
        assert_eq!(c.observe(&obs(1, 1, 0)), Verdict::Finalize(TrialEnd::Timeout));
    }

    #[test]
    fn test_holds_until_baseline_then_resumes() {
        let mut c = EpochController::new(EpochConfig::default());
        c.observe(&obs(2, 1, 20));
        c.mark_finalized();
        assert_eq!(c.phase(), Phase::AwaitingReset);

        // Still at level 2 with workers alive: nothing happens.
        assert_eq!(c.observe(&obs(2, 1, 20)), Verdict::Hold);
        assert_eq!(c.observe(&obs(2, 0, 20)), Verdict::Hold);

        assert_eq!(c.observe(&obs(1, 0, 0)), Verdict::Resume);
        assert_eq!(c.phase(), Phase::Running);
        assert_eq!(c.trial_ticks(), 0);
        assert_eq!(c.epochs_completed(), 1);
    }

    #[test]
    fn test_pause_between_trials_variant() {
        let config = EpochConfig {
            pause_between_trials: true,
            ..Default::default()
        };
        let mut c = EpochController::new(config);
        c.observe(&obs(2, 1, 20));
        c.mark_finalized();
        assert_eq!(c.phase(), Phase::PausedAfterTrial);
        assert_eq!(c.observe(&obs(2, 1, 20)), Verdict::Hold);
        assert_eq!(c.observe(&obs(1, 0, 0)), Verdict::Resume);
    }

    #[test]
    fn test_manual_reset_request_forces_timeout() {
        let mut c = EpochController::new(EpochConfig::default());
        assert_eq!(c.observe(&obs(1, 1, 0)), Verdict::Continue);
        c.request_end();
        assert_eq!(c.observe(&obs(1, 1, 0)), Verdict::Finalize(TrialEnd::Timeout));
    }

    #[test]
    fn test_milestones_track_level_ups() {
        let mut c = EpochController::new(EpochConfig {
            goal_level_target: 3,
            ..Default::default()
        });
        c.observe(&obs(1, 1, 0));
        c.observe(&obs(1, 1, 5));
        c.observe(&obs(2, 1, 10));
        c.observe(&obs(2, 1, 15));
        assert_eq!(c.milestones().reached, vec![(2, 3)]);
    }

    #[test]
    fn test_checkpoint_cadence() {
        let config = EpochConfig {
            checkpoint_interval: 2,
            ..Default::default()
        };
        let mut c = EpochController::new(config);
        c.observe(&obs(1, 1, 0));
        assert!(!c.should_checkpoint());
        c.observe(&obs(1, 1, 0));
        assert!(c.should_checkpoint());
    }
}
