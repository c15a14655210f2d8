//! End-to-end epoch flows against a scripted world collaborator.

use rand::rngs::StdRng;
use rand::SeedableRng;

use colonia_checkpoint::{MemorySlots, SlotId, SlotStore};
use colonia_common::{EffectReport, Observation, Role, RoleCounts, SpawnOutcome, SpawnRequest};
use colonia_epoch::{ColonyRuntime, RuntimeConfig, TickOutcome, TrialEnd, WorldPort};
use colonia_policy::{AgentStats, Strategy};

fn trace_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Scripted collaborator: accepts every request and records what it saw.
#[derive(Default)]
struct ScriptedWorld {
    requests: Vec<SpawnRequest>,
    resets_requested: usize,
    malformed_next: u16,
}

impl WorldPort for ScriptedWorld {
    fn apply(&mut self, request: Option<&SpawnRequest>) -> EffectReport {
        let spawn = request.map(|req| {
            self.requests.push(req.clone());
            SpawnOutcome::Spawned
        });
        let report = EffectReport {
            spawn,
            malformed_workers: self.malformed_next,
        };
        self.malformed_next = 0;
        report
    }

    fn request_reset(&mut self) {
        self.resets_requested += 1;
    }
}

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

fn runtime(config: RuntimeConfig, slots: MemorySlots) -> ColonyRuntime<MemorySlots> {
    ColonyRuntime::new(config, slots, StdRng::seed_from_u64(17))
}

fn evolution_config(timeout: u64) -> RuntimeConfig {
    let mut cfg = RuntimeConfig::default();
    cfg.strategy = Strategy::Evolution;
    cfg.epoch.trial_timeout_ticks = timeout;
    cfg
}

#[test]
fn test_missing_environment_skips_tick() {
    let mut rt = runtime(RuntimeConfig::default(), MemorySlots::new());
    let mut world = ScriptedWorld::default();
    assert_eq!(rt.tick(None, &mut world), TickOutcome::Skipped);
    assert!(world.requests.is_empty());
}

#[test]
fn test_bootstrap_forces_basic_harvester() {
    let mut rt = runtime(RuntimeConfig::default(), MemorySlots::new());
    let mut world = ScriptedWorld::default();

    // Start the trial with some workers so the first tick is a normal one,
    // then lose them all.
    assert!(matches!(
        rt.tick(Some(&obs(1, 1, 0)), &mut world),
        TickOutcome::Acted { .. }
    ));
    world.requests.clear();

    let out = rt.tick(Some(&obs(1, 0, 10)), &mut world);
    assert_eq!(out, TickOutcome::Bootstrapped);
    assert_eq!(world.requests.len(), 1);
    assert_eq!(world.requests[0].role, Role::Harvester);
}

#[test]
fn test_goal_reached_finalizes_once_then_holds() {
    trace_init();
    let mut rt = runtime(RuntimeConfig::default(), MemorySlots::new());
    let mut world = ScriptedWorld::default();

    for tick in 0..5 {
        assert!(matches!(
            rt.tick(Some(&obs(1, 1, tick * 3)), &mut world),
            TickOutcome::Acted { .. }
        ));
    }
    let out = rt.tick(Some(&obs(2, 1, 20)), &mut world);
    assert!(matches!(
        out,
        TickOutcome::Finalized {
            reason: TrialEnd::GoalReached,
            ..
        }
    ));
    assert_eq!(world.resets_requested, 1);

    // Finalize is guarded: repeated ticks in the waiting phase change nothing.
    let before = rt.stats();
    for _ in 0..5 {
        assert_eq!(rt.tick(Some(&obs(2, 1, 20)), &mut world), TickOutcome::Holding);
    }
    assert_eq!(rt.stats(), before);
    assert_eq!(world.resets_requested, 1);

    // Baseline observation resumes a fresh trial.
    assert_eq!(rt.tick(Some(&obs(1, 0, 0)), &mut world), TickOutcome::Resumed);
}

#[test]
fn test_finalize_idempotence_preserves_ga_counters() {
    let mut rt = runtime(evolution_config(2), MemorySlots::new());
    let mut world = ScriptedWorld::default();

    assert!(matches!(
        rt.tick(Some(&obs(1, 1, 0)), &mut world),
        TickOutcome::Acted { .. }
    ));
    assert!(matches!(
        rt.tick(Some(&obs(1, 1, 4)), &mut world),
        TickOutcome::Finalized {
            reason: TrialEnd::Timeout,
            ..
        }
    ));

    let AgentStats::Evolution {
        generation,
        individual,
        ..
    } = rt.stats()
    else {
        panic!("expected evolution stats");
    };
    assert_eq!((generation, individual), (0, 1));

    for _ in 0..4 {
        assert_eq!(rt.tick(Some(&obs(1, 1, 4)), &mut world), TickOutcome::Holding);
    }
    let AgentStats::Evolution {
        generation,
        individual,
        ..
    } = rt.stats()
    else {
        panic!("expected evolution stats");
    };
    assert_eq!((generation, individual), (0, 1));
}

#[test]
fn test_generation_advances_after_population_swept() {
    let mut rt = runtime(evolution_config(2), MemorySlots::new());
    let mut world = ScriptedWorld::default();

    for _ in 0..6 {
        assert!(matches!(
            rt.tick(Some(&obs(1, 1, 0)), &mut world),
            TickOutcome::Acted { .. } | TickOutcome::Bootstrapped
        ));
        assert!(matches!(
            rt.tick(Some(&obs(1, 1, 5)), &mut world),
            TickOutcome::Finalized { .. }
        ));
        assert_eq!(rt.tick(Some(&obs(1, 0, 0)), &mut world), TickOutcome::Resumed);
    }

    let AgentStats::Evolution {
        generation,
        individual,
        ..
    } = rt.stats()
    else {
        panic!("expected evolution stats");
    };
    assert_eq!((generation, individual), (1, 0));
}

#[test]
fn test_checkpoint_restores_across_runtimes() {
    let slots = MemorySlots::new();
    let mut world = ScriptedWorld::default();

    {
        let mut rt = runtime(evolution_config(2), slots.clone());
        rt.tick(Some(&obs(1, 1, 0)), &mut world);
        let out = rt.tick(Some(&obs(1, 1, 5)), &mut world);
        assert!(matches!(out, TickOutcome::Finalized { .. }));
    }

    // A brand-new runtime over the same slots picks up the paused state and
    // the GA bookkeeping from the blob.
    let mut rt = runtime(evolution_config(2), slots);
    assert_eq!(rt.tick(Some(&obs(1, 1, 5)), &mut world), TickOutcome::Holding);
    assert_eq!(rt.tick(Some(&obs(1, 0, 0)), &mut world), TickOutcome::Resumed);

    let AgentStats::Evolution { individual, .. } = rt.stats() else {
        panic!("expected evolution stats");
    };
    assert_eq!(individual, 1);
}

#[test]
fn test_corrupt_checkpoint_recovers_to_defaults() {
    trace_init();
    let mut slots = MemorySlots::new();
    slots
        .write(SlotId::Policy, "\u{7f}garbage that is definitely not json")
        .unwrap();

    let mut rt = runtime(RuntimeConfig::default(), slots);
    let mut world = ScriptedWorld::default();
    assert!(matches!(
        rt.tick(Some(&obs(1, 1, 0)), &mut world),
        TickOutcome::Acted { .. }
    ));

    let AgentStats::QLearning {
        episodes,
        table_size,
        ..
    } = rt.stats()
    else {
        panic!("expected q-learning stats");
    };
    assert_eq!((episodes, table_size), (0, 0));
}

#[test]
fn test_periodic_checkpoint_inside_trial() {
    let slots = MemorySlots::new();
    let mut cfg = RuntimeConfig::default();
    cfg.strategy = Strategy::OneStepTd;
    cfg.epoch.checkpoint_interval = 2;
    cfg.qlearning.epsilon = 0.0;

    let mut world = ScriptedWorld::default();
    {
        let mut rt = runtime(cfg.clone(), slots.clone());
        // Two decision ticks: the second completes the first transition and
        // lands on the checkpoint cadence.
        rt.tick(Some(&obs(1, 1, 0)), &mut world);
        rt.tick(Some(&obs(1, 1, 3)), &mut world);
    }

    let mut rt = runtime(cfg, slots);
    rt.tick(Some(&obs(1, 1, 3)), &mut world);
    let AgentStats::QLearning { table_size, .. } = rt.stats() else {
        panic!("expected q-learning stats");
    };
    assert!(table_size >= 1);
}

#[test]
fn test_evaluation_mode_disables_learning() {
    let mut cfg = RuntimeConfig::default();
    cfg.strategy = Strategy::OneStepTd;
    let mut rt = runtime(cfg, MemorySlots::new());
    rt.set_evaluating(true);

    let mut world = ScriptedWorld::default();
    for tick in 0..10 {
        rt.tick(Some(&obs(1, 1, tick)), &mut world);
    }

    let AgentStats::QLearning { table_size, .. } = rt.stats() else {
        panic!("expected q-learning stats");
    };
    assert_eq!(table_size, 0);
}

#[test]
fn test_manual_reset_request_ends_trial() {
    let mut rt = runtime(RuntimeConfig::default(), MemorySlots::new());
    let mut world = ScriptedWorld::default();

    rt.tick(Some(&obs(1, 1, 0)), &mut world);
    rt.request_manual_reset();
    assert!(matches!(
        rt.tick(Some(&obs(1, 1, 2)), &mut world),
        TickOutcome::Finalized {
            reason: TrialEnd::Timeout,
            ..
        }
    ));
}

#[test]
fn test_metrics_emitted_once_per_trial() {
    let mut rt = runtime(RuntimeConfig::default(), MemorySlots::new());
    let mut world = ScriptedWorld::default();

    rt.tick(Some(&obs(1, 1, 0)), &mut world);
    rt.tick(Some(&obs(1, 1, 4)), &mut world);
    rt.tick(Some(&obs(2, 1, 9)), &mut world);

    let summary = rt.take_metrics().expect("summary after finalize");
    assert_eq!(summary.reason, TrialEnd::GoalReached);
    assert_eq!(summary.trial_ticks, 3);
    assert_eq!(summary.milestones, vec![(2, 3)]);

    // The slot is cleared once taken.
    assert!(rt.take_metrics().is_none());
}

#[test]
fn test_malformed_worker_penalty_reaches_the_table() {
    let mut cfg = RuntimeConfig::default();
    cfg.strategy = Strategy::OneStepTd;
    cfg.qlearning.epsilon = 0.0;
    let mut rt = runtime(cfg, MemorySlots::new());
    let mut world = ScriptedWorld::default();

    world.malformed_next = 1;
    rt.tick(Some(&obs(1, 1, 0)), &mut world);
    // Completing the transition applies the -50 on the next tick.
    rt.tick(Some(&obs(1, 1, 0)), &mut world);

    let AgentStats::QLearning { table_size, .. } = rt.stats() else {
        panic!("expected q-learning stats");
    };
    assert_eq!(table_size, 1);
}
