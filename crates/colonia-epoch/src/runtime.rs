//! Per-tick orchestration
//!
//! One [`ColonyRuntime`] owns the policy engine, the epoch controller, and
//! the checkpoint store, and exposes a single [`ColonyRuntime::tick`] entry.
//! State is restored once on the first observed tick and persisted at the
//! checkpoint cadence and at every trial boundary, never read or written
//! ad hoc in between.

use chrono::Utc;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use colonia_checkpoint::{CheckpointStore, ControlFlags, SlotStore};
use colonia_common::catalog::{self, CatalogContext};
use colonia_common::{
    Action, EffectReport, Observation, Role, SpawnOutcome, SpawnRequest, WorldState,
};
use colonia_policy::{Agent, AgentStats, PolicyEngine, PolicySnapshot, RewardSignal};

use crate::config::RuntimeConfig;
use crate::controller::{EpochController, TrialEnd, Verdict};
use crate::reward::{self, RewardContext};

/// The action-effect boundary a host implements.
pub trait WorldPort {
    /// Apply this tick's spawn request, if any, and report what happened.
    fn apply(&mut self, request: Option<&SpawnRequest>) -> EffectReport;

    /// Ask the external host to reset the world to its baseline.
    fn request_reset(&mut self);
}

/// What one tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No observable world this tick; nothing was touched.
    Skipped,
    /// Finalized earlier; still waiting for the external reset.
    Holding,
    /// The world returned to baseline and a new trial started.
    Resumed,
    /// Population was empty; a bootstrap harvester was requested.
    Bootstrapped,
    /// A policy decision was made and applied.
    Acted { action: Action },
    /// The trial boundary was hit and finalize ran.
    Finalized { reason: TrialEnd, fitness: f64 },
}

/// Compact per-epoch summary written to the metrics slot at finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub epoch: u64,
    pub reason: TrialEnd,
    pub trial_ticks: u64,
    pub fitness: f64,
    /// `(goal_level, tick_reached)` pairs for this trial.
    pub milestones: Vec<(u8, u64)>,
    pub agent: AgentStats,
    /// Unix milliseconds.
    pub finished_at: i64,
}

pub struct ColonyRuntime<S: SlotStore> {
    engine: PolicyEngine,
    controller: EpochController,
    store: CheckpointStore<S>,
    control: ControlFlags,
    last_progress: Option<u64>,
    restored: bool,
}

impl<S: SlotStore> ColonyRuntime<S> {
    pub fn new(config: RuntimeConfig, slots: S, rng: StdRng) -> Self {
        let engine = PolicyEngine::new(
            config.strategy,
            config.qlearning.clone(),
            config.evolution.clone(),
            rng,
        );
        ColonyRuntime {
            engine,
            controller: EpochController::new(config.epoch),
            store: CheckpointStore::with_config(slots, config.checkpoint),
            control: ControlFlags::default(),
            last_progress: None,
            restored: false,
        }
    }

    /// External evaluation/frozen-mode flag: greedy policy, no learning.
    pub fn set_evaluating(&mut self, evaluating: bool) {
        self.control.evaluating = evaluating;
        self.engine.set_frozen(evaluating);
    }

    /// External manual-reset-request flag: end the running trial on the
    /// next tick.
    pub fn request_manual_reset(&mut self) {
        self.controller.request_end();
    }

    pub fn stats(&self) -> AgentStats {
        self.engine.stats()
    }

    pub fn controller(&self) -> &EpochController {
        &self.controller
    }

    /// Take the metrics summary out of the store, clearing its slot.
    pub fn take_metrics(&mut self) -> Option<MetricsSummary> {
        self.store.take_metrics()
    }

    /// Run one synchronous decision tick.
    pub fn tick(&mut self, obs: Option<&Observation>, world: &mut dyn WorldPort) -> TickOutcome {
        let Some(obs) = obs else {
            // No observable world: skip the tick entirely.
            return TickOutcome::Skipped;
        };
        if !self.restored {
            self.restore_from_store();
        }

        match self.controller.observe(obs) {
            Verdict::Hold => TickOutcome::Holding,
            Verdict::Resume => {
                self.control.paused = false;
                self.last_progress = None;
                info!("world reset observed, new epoch started");
                TickOutcome::Resumed
            }
            Verdict::Finalize(reason) => self.finalize(reason, obs, world),
            Verdict::Continue => self.decide(obs, world),
        }
    }

    fn decide(&mut self, obs: &Observation, world: &mut dyn WorldPort) -> TickOutcome {
        if obs.population_empty {
            // Empty colony: force a basic harvester before consulting the
            // policy, and skip this tick's learning.
            let request = SpawnRequest::basic(Role::Harvester);
            let report = world.apply(Some(&request));
            if !matches!(
                report.spawn,
                Some(SpawnOutcome::Spawned) | Some(SpawnOutcome::Busy)
            ) {
                debug!(
                    energy = obs.energy_available,
                    "bootstrap spawn not accepted"
                );
            }
            self.last_progress = Some(obs.goal_progress);
            return TickOutcome::Bootstrapped;
        }

        let state = WorldState::encode(obs);
        let actions = catalog::legal_actions(&CatalogContext {
            goal_level: obs.goal_level,
        });

        // Complete the previous tick's transition before acting on this one.
        if let Some(summary) = self.engine.maybe_learn(&state, &actions) {
            debug!(
                episode = summary.episodes,
                avg_reward = summary.avg_reward,
                epsilon = summary.epsilon,
                q_size = summary.table_size,
                "learning step"
            );
        }

        let action = self.engine.act(&state, &actions);
        let request = match &action {
            Action::Spawn { role, body } => Some(SpawnRequest {
                role: *role,
                body: body.clone(),
            }),
            Action::Wait => None,
        };
        let report = world.apply(request.as_ref());
        if matches!(report.spawn, Some(SpawnOutcome::InsufficientResources)) {
            debug!(action = %action, "spawn request lacked resources");
        }

        let progress_delta = self
            .last_progress
            .map_or(0, |prev| obs.goal_progress.saturating_sub(prev));
        self.last_progress = Some(obs.goal_progress);

        let shaped = reward::shape(&RewardContext {
            obs,
            action: &action,
            progress_delta,
            malformed_workers: report.malformed_workers,
        });
        self.engine.record_outcome(
            &state,
            &action,
            RewardSignal {
                shaped,
                progress_delta: progress_delta as f64,
            },
        );

        self.control.last_goal_level = obs.goal_level;
        if self.controller.should_checkpoint() {
            self.persist();
        }
        TickOutcome::Acted { action }
    }

    /// Runs exactly once per trial: the controller moves out of `Running`
    /// immediately afterwards and holds every subsequent tick.
    fn finalize(
        &mut self,
        reason: TrialEnd,
        obs: &Observation,
        world: &mut dyn WorldPort,
    ) -> TickOutcome {
        let goal_reached = matches!(reason, TrialEnd::GoalReached);
        let report = self.engine.finalize_trial(goal_reached);

        self.control.paused = true;
        self.control.last_goal_level = obs.goal_level;
        self.sync_control();
        self.persist();

        let summary = MetricsSummary {
            epoch: self.controller.epochs_completed(),
            reason,
            trial_ticks: self.controller.trial_ticks(),
            fitness: report.fitness,
            milestones: self.controller.milestones().reached.clone(),
            agent: self.engine.stats(),
            finished_at: Utc::now().timestamp_millis(),
        };
        if let Err(err) = self.store.save_metrics(&summary) {
            warn!(error = %err, "metrics summary not saved");
        }

        world.request_reset();
        self.controller.mark_finalized();
        info!(
            ?reason,
            fitness = report.fitness,
            generation_advanced = report.generation_advanced,
            "trial finalized, awaiting external reset"
        );
        TickOutcome::Finalized {
            reason,
            fitness: report.fitness,
        }
    }

    fn sync_control(&mut self) {
        if let AgentStats::Evolution {
            generation,
            individual,
            ..
        } = self.engine.stats()
        {
            self.control.generation = generation;
            self.control.individual = individual;
        }
    }

    fn persist(&mut self) {
        match self.store.save_policy(&self.control, self.engine.snapshot()) {
            Ok(size) => debug!(bytes = size, "policy checkpoint saved"),
            Err(err) => warn!(error = %err, "policy checkpoint not saved"),
        }
        if let Err(err) = self.store.save_status(&self.control) {
            warn!(error = %err, "status record not saved");
        }
    }

    /// First-tick restore: validate-before-trust, defaults on any failure.
    fn restore_from_store(&mut self) {
        let blob = self.store.load_policy::<PolicySnapshot>();
        let was_evaluating = self.control.evaluating;
        self.control = blob.control;
        self.control.evaluating |= was_evaluating;
        self.engine.restore(blob.policy);
        if self.control.evaluating {
            self.engine.set_frozen(true);
        }
        if self.control.paused {
            // A finalize already happened; wait for the external reset.
            self.controller.hold_for_reset();
        }
        self.restored = true;
        debug!(run_id = %blob.run_id, "agent state restored");
    }
}
