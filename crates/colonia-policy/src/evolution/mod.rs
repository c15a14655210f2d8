//! Evolutionary policy engine
//!
//! A fixed-size population of complete policy tables is evaluated one
//! individual per trial. Fitness is the sum of per-tick goal-progress
//! deltas plus a terminal bonus when the goal level is reached. Once the
//! whole population has been scored, the two best individuals carry over
//! unchanged and the remainder is bred from the top of the ranked list by
//! per-gene crossover and mutation.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use colonia_common::{catalog, Action, WorldState};

use crate::snapshot::PolicySnapshot;
use crate::{Agent, AgentStats, LearnSummary, RewardSignal, TrialReport};

mod chromosome;

pub use chromosome::Chromosome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub population_size: usize,
    /// Per-gene probability of inheriting from parent A.
    pub crossover_rate: f64,
    /// Per-gene probability of uniform resampling.
    pub mutation_rate: f64,
    /// Individuals copied unchanged into the next generation.
    pub elite_count: usize,
    /// Parents are drawn from the top of the ranked list.
    pub parent_pool: usize,
    /// Added to fitness when the trial reached the goal level.
    pub terminal_bonus: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 6,
            crossover_rate: 0.7,
            mutation_rate: 0.01,
            elite_count: 2,
            parent_pool: 5,
            terminal_bonus: 50.0,
        }
    }
}

pub struct EvolutionAgent {
    alphabet: Vec<Action>,
    population: Vec<Chromosome>,
    fitness: Vec<f64>,
    current: usize,
    generation: u32,
    trial_reward: f64,
    config: EvolutionConfig,
    rng: StdRng,
}

impl EvolutionAgent {
    pub fn new(config: EvolutionConfig, mut rng: StdRng) -> Self {
        let mut config = config;
        config.population_size = config.population_size.max(2);
        config.elite_count = config.elite_count.min(config.population_size);
        config.parent_pool = config.parent_pool.clamp(2, config.population_size);

        let alphabet = catalog::alphabet();
        let population = Self::seed_population(&config, &alphabet, &mut rng);
        EvolutionAgent {
            fitness: vec![0.0; config.population_size],
            current: 0,
            generation: 0,
            trial_reward: 0.0,
            alphabet,
            population,
            config,
            rng,
        }
    }

    /// Generation 0: the hand-authored baseline at index 0, the rest random.
    fn seed_population(
        config: &EvolutionConfig,
        alphabet: &[Action],
        rng: &mut StdRng,
    ) -> Vec<Chromosome> {
        let mut population = vec![Chromosome::baseline(alphabet)];
        while population.len() < config.population_size {
            population.push(Chromosome::random(alphabet.len(), rng));
        }
        population
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn current_individual(&self) -> usize {
        self.current
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn fitness(&self) -> &[f64] {
        &self.fitness
    }

    /// Direct policy lookup for a given individual, total by construction.
    pub fn act_for(&self, individual: usize, state: &WorldState) -> Action {
        let idx = individual.min(self.population.len() - 1);
        self.population[idx].action(state, &self.alphabet).clone()
    }

    fn best_fitness(&self) -> f64 {
        self.fitness.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    /// Rank by fitness, carry the elite unchanged, breed the remainder from
    /// two distinct parents drawn from the top of the ranked list.
    fn advance_generation(&mut self) {
        let size = self.config.population_size;
        let mut order: Vec<usize> = (0..size).collect();
        order.sort_by(|&a, &b| {
            self.fitness[b]
                .partial_cmp(&self.fitness[a])
                .unwrap_or(Ordering::Equal)
        });

        let mut next: Vec<Chromosome> = order
            .iter()
            .take(self.config.elite_count)
            .map(|&i| self.population[i].clone())
            .collect();

        let pool = &order[..self.config.parent_pool];
        while next.len() < size {
            let i = pool[self.rng.gen_range(0..pool.len())];
            let mut j = i;
            while j == i {
                j = pool[self.rng.gen_range(0..pool.len())];
            }
            let mut child = Chromosome::crossover(
                &self.population[i],
                &self.population[j],
                self.config.crossover_rate,
                &mut self.rng,
            );
            child.mutate(self.config.mutation_rate, self.alphabet.len(), &mut self.rng);
            next.push(child);
        }

        self.population = next;
        self.fitness = vec![0.0; size];
        self.current = 0;
        self.generation += 1;
        info!(generation = self.generation, "generation ready");
    }
}

impl Agent for EvolutionAgent {
    fn act(&mut self, state: &WorldState, actions: &[Action]) -> Action {
        if actions.is_empty() {
            return Action::Wait;
        }
        self.act_for(self.current, state)
    }

    fn record_outcome(&mut self, _state: &WorldState, _action: &Action, signal: RewardSignal) {
        self.trial_reward += signal.progress_delta;
    }

    fn maybe_learn(
        &mut self,
        _next_state: &WorldState,
        _next_actions: &[Action],
    ) -> Option<LearnSummary> {
        // Learning happens at the generation boundary, not per tick.
        None
    }

    fn finalize_trial(&mut self, goal_reached: bool) -> TrialReport {
        let mut fitness = self.trial_reward;
        if goal_reached {
            fitness += self.config.terminal_bonus;
        }
        self.fitness[self.current] = fitness;
        debug!(
            individual = self.current,
            generation = self.generation,
            fitness,
            "trial scored"
        );

        self.trial_reward = 0.0;
        self.current += 1;
        let advanced = self.current >= self.config.population_size;
        if advanced {
            self.advance_generation();
        }
        TrialReport {
            fitness,
            generation_advanced: advanced,
        }
    }

    fn set_frozen(&mut self, _frozen: bool) {
        // Chromosome lookups are already deterministic; there is no
        // exploration to disable.
    }

    fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::Evolution {
            genes: self.population.iter().map(|c| c.genes().to_vec()).collect(),
            fitness: self.fitness.clone(),
            individual: self.current,
            generation: self.generation,
        }
    }

    fn restore(&mut self, snapshot: PolicySnapshot) {
        match snapshot {
            PolicySnapshot::Evolution {
                genes,
                fitness,
                individual,
                generation,
            } => {
                let restored: Option<Vec<Chromosome>> = genes
                    .into_iter()
                    .map(|g| Chromosome::from_genes(g, self.alphabet.len()))
                    .collect();
                match restored {
                    Some(population)
                        if population.len() == self.config.population_size
                            && fitness.len() == population.len() =>
                    {
                        self.current = individual.min(population.len() - 1);
                        self.population = population;
                        self.fitness = fitness;
                        self.generation = generation;
                        self.trial_reward = 0.0;
                    }
                    _ => {
                        warn!("stored population does not match this configuration, reseeding");
                        self.population =
                            Self::seed_population(&self.config, &self.alphabet, &mut self.rng);
                        self.fitness = vec![0.0; self.config.population_size];
                        self.current = 0;
                        self.generation = 0;
                        self.trial_reward = 0.0;
                    }
                }
            }
            PolicySnapshot::QLearning { table, episodes, .. }
                if table.is_empty() && episodes == 0 =>
            {
                // Blank fallback blob: nothing to adopt.
            }
            PolicySnapshot::QLearning { .. } => {
                warn!("snapshot holds a table, not a population; keeping fresh state");
            }
        }
    }

    fn stats(&self) -> AgentStats {
        AgentStats::Evolution {
            generation: self.generation,
            individual: self.current,
            population_size: self.config.population_size,
            trial_reward: self.trial_reward,
            best_fitness: self.best_fitness(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use colonia_common::EnergyBucket;

    use super::*;

    fn agent() -> EvolutionAgent {
        EvolutionAgent::new(EvolutionConfig::default(), StdRng::seed_from_u64(99))
    }

    fn signal(progress: f64) -> RewardSignal {
        RewardSignal {
            shaped: 0.0,
            progress_delta: progress,
        }
    }

    fn any_state() -> WorldState {
        WorldState {
            energy: EnergyBucket::Ready,
            harvesters: 1,
            upgraders: 1,
            builders: 0,
            goal_level: 1,
        }
    }

    #[test]
    fn test_lookup_is_total() {
        let mut a = agent();
        let actions = vec![Action::Wait];
        for state in WorldState::enumerate() {
            let _ = a.act(&state, &actions);
        }
    }

    #[test]
    fn test_fitness_accumulates_and_bonus_applies() {
        let mut a = agent();
        let state = any_state();
        a.record_outcome(&state, &Action::Wait, signal(3.0));
        a.record_outcome(&state, &Action::Wait, signal(2.0));
        let report = a.finalize_trial(true);
        assert!((report.fitness - 55.0).abs() < 1e-9);
        assert_eq!(a.fitness()[0], report.fitness);
        assert_eq!(a.current_individual(), 1);
    }

    #[test]
    fn test_elitism_preserves_top_two() {
        let mut a = agent();
        let state = any_state();
        // Score the six individuals 10, 20, .., 60.
        for i in 0..6 {
            a.record_outcome(&state, &Action::Wait, signal((i as f64 + 1.0) * 10.0));
            let before: Vec<Chromosome> = a.population().to_vec();
            let report = a.finalize_trial(false);
            if report.generation_advanced {
                // Indices 5 and 4 scored highest.
                assert_eq!(a.population()[0], before[5]);
                assert_eq!(a.population()[1], before[4]);
            }
        }
        assert_eq!(a.generation(), 1);
    }

    #[test]
    fn test_generation_advance_resets_bookkeeping() {
        let mut a = agent();
        let state = any_state();
        for _ in 0..6 {
            a.record_outcome(&state, &Action::Wait, signal(1.0));
            a.finalize_trial(false);
        }
        assert_eq!(a.generation(), 1);
        assert_eq!(a.current_individual(), 0);
        assert!(a.fitness().iter().all(|&f| f == 0.0));
        assert_eq!(a.population().len(), 6);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut a = agent();
        let state = any_state();
        a.record_outcome(&state, &Action::Wait, signal(4.0));
        a.finalize_trial(false);
        let snap = a.snapshot();

        let mut restored = agent();
        restored.restore(snap);
        assert_eq!(restored.population(), a.population());
        assert_eq!(restored.fitness(), a.fitness());
        assert_eq!(restored.current_individual(), 1);
        assert_eq!(restored.generation(), 0);
    }

    #[test]
    fn test_restore_rejects_mismatched_population() {
        let mut a = agent();
        let seeded: Vec<Chromosome> = a.population().to_vec();
        a.restore(PolicySnapshot::Evolution {
            genes: vec![vec![0; 3]],
            fitness: vec![1.0],
            individual: 0,
            generation: 9,
        });
        assert_eq!(a.generation(), 0);
        assert_eq!(a.population().len(), seeded.len());
    }

    #[test]
    fn test_blank_fallback_blob_is_ignored() {
        let mut a = agent();
        let before: Vec<Chromosome> = a.population().to_vec();
        a.restore(PolicySnapshot::default());
        assert_eq!(a.population(), &before[..]);
    }
}
