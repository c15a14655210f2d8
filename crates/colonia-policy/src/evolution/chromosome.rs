//! GA individuals: complete state→action lookup tables
//!
//! A chromosome holds one gene per enumerated world state; each gene is an
//! index into the level-independent action alphabet, so lookups are total by
//! construction. Chromosomes are immutable once under evaluation; fitness
//! lives in the population's parallel array, never inside the individual.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use colonia_common::{catalog, Action, BodyShape, Role, WorldState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    genes: Vec<u8>,
}

impl Chromosome {
    /// Uniformly random policy.
    pub fn random(alphabet_len: usize, rng: &mut StdRng) -> Self {
        let genes = (0..WorldState::DOMAIN_SIZE)
            .map(|_| rng.gen_range(0..alphabet_len) as u8)
            .collect();
        Chromosome { genes }
    }

    /// The hand-authored safety-net policy seeded at index 0 of generation
    /// 0: secure a harvester first, then an upgrader, otherwise wait.
    pub fn baseline(alphabet: &[Action]) -> Self {
        let find = |action: &Action| catalog::index_of(alphabet, action).unwrap_or(0) as u8;
        let harvester = find(&Action::Spawn {
            role: Role::Harvester,
            body: BodyShape::basic(),
        });
        let upgrader = find(&Action::Spawn {
            role: Role::Upgrader,
            body: BodyShape::basic(),
        });
        let wait = find(&Action::Wait);

        let genes = WorldState::enumerate()
            .iter()
            .map(|state| {
                if state.harvesters == 0 {
                    harvester
                } else if state.upgraders == 0 {
                    upgrader
                } else {
                    wait
                }
            })
            .collect();
        Chromosome { genes }
    }

    /// Rebuild a chromosome from stored genes, rejecting anything that does
    /// not cover the current domain and alphabet.
    pub fn from_genes(genes: Vec<u8>, alphabet_len: usize) -> Option<Self> {
        if genes.len() != WorldState::DOMAIN_SIZE {
            return None;
        }
        if genes.iter().any(|&g| g as usize >= alphabet_len) {
            return None;
        }
        Some(Chromosome { genes })
    }

    pub fn gene(&self, state: &WorldState) -> usize {
        self.genes[state.index()] as usize
    }

    /// Total policy lookup.
    pub fn action<'a>(&self, state: &WorldState, alphabet: &'a [Action]) -> &'a Action {
        &alphabet[self.gene(state)]
    }

    pub fn genes(&self) -> &[u8] {
        &self.genes
    }

    /// Per-gene crossover: inherit from `a` with probability `pc`, else from
    /// `b`. The draw is over `[0, 1)`, so `pc = 1` reproduces `a` exactly and
    /// `pc = 0` reproduces `b`.
    pub fn crossover(a: &Chromosome, b: &Chromosome, pc: f64, rng: &mut StdRng) -> Chromosome {
        let genes = a
            .genes
            .iter()
            .zip(&b.genes)
            .map(|(&ga, &gb)| if rng.gen::<f64>() < pc { ga } else { gb })
            .collect();
        Chromosome { genes }
    }

    /// Per-gene mutation: with probability `pm`, resample the gene uniformly
    /// from the alphabet.
    pub fn mutate(&mut self, pm: f64, alphabet_len: usize, rng: &mut StdRng) {
        for gene in &mut self.genes {
            if rng.gen::<f64>() < pm {
                *gene = rng.gen_range(0..alphabet_len) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_random_genes_cover_domain() {
        let alphabet = catalog::alphabet();
        let c = Chromosome::random(alphabet.len(), &mut rng());
        assert_eq!(c.genes().len(), WorldState::DOMAIN_SIZE);
        assert!(c.genes().iter().all(|&g| (g as usize) < alphabet.len()));
    }

    #[test]
    fn test_baseline_secures_economy_first() {
        let alphabet = catalog::alphabet();
        let c = Chromosome::baseline(&alphabet);
        for state in WorldState::enumerate() {
            let action = c.action(&state, &alphabet);
            match (state.harvesters, state.upgraders) {
                (0, _) => assert_eq!(
                    *action,
                    Action::Spawn {
                        role: Role::Harvester,
                        body: BodyShape::basic()
                    }
                ),
                (_, 0) => assert_eq!(
                    *action,
                    Action::Spawn {
                        role: Role::Upgrader,
                        body: BodyShape::basic()
                    }
                ),
                _ => assert_eq!(*action, Action::Wait),
            }
        }
    }

    #[test]
    fn test_crossover_degenerate_rates() {
        let alphabet = catalog::alphabet();
        let mut r = rng();
        let a = Chromosome::random(alphabet.len(), &mut r);
        let b = Chromosome::random(alphabet.len(), &mut r);

        let all_a = Chromosome::crossover(&a, &b, 1.0, &mut r);
        assert_eq!(all_a, a);

        let all_b = Chromosome::crossover(&a, &b, 0.0, &mut r);
        assert_eq!(all_b, b);
    }

    #[test]
    fn test_mutation_rate_zero_is_identity() {
        let alphabet = catalog::alphabet();
        let mut r = rng();
        let original = Chromosome::random(alphabet.len(), &mut r);
        let mut mutated = original.clone();
        mutated.mutate(0.0, alphabet.len(), &mut r);
        assert_eq!(mutated, original);
    }

    #[test]
    fn test_from_genes_validates() {
        let alphabet = catalog::alphabet();
        assert!(Chromosome::from_genes(vec![0; WorldState::DOMAIN_SIZE], alphabet.len()).is_some());
        assert!(Chromosome::from_genes(vec![0; 3], alphabet.len()).is_none());
        assert!(
            Chromosome::from_genes(vec![u8::MAX; WorldState::DOMAIN_SIZE], alphabet.len())
                .is_none()
        );
    }
}
