//! Per-tick observation snapshot from the world collaborator

use serde::{Deserialize, Serialize};

use super::action::Role;
use crate::BASELINE_GOAL_LEVEL;

/// Per-role active worker counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub harvesters: u16,
    pub upgraders: u16,
    pub builders: u16,
}

impl RoleCounts {
    pub fn get(&self, role: Role) -> u16 {
        match role {
            Role::Harvester => self.harvesters,
            Role::Upgrader => self.upgraders,
            Role::Builder => self.builders,
        }
    }

    pub fn total(&self) -> u16 {
        self.harvesters + self.upgraders + self.builders
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Everything the engine is allowed to observe in one tick.
///
/// `goal_progress` is monotonically non-decreasing within an epoch;
/// `population_empty` is the bootstrap signal asserted by the collaborator
/// when no workers exist at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub energy_available: u32,
    pub workers: RoleCounts,
    pub goal_progress: u64,
    pub goal_level: u8,
    pub population_empty: bool,
}

impl Observation {
    /// True when the world has returned to its post-reset baseline
    /// configuration: goal level at minimum and zero active workers.
    pub fn at_baseline(&self) -> bool {
        self.goal_level <= BASELINE_GOAL_LEVEL && self.workers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(level: u8, harvesters: u16) -> Observation {
        Observation {
            energy_available: 300,
            workers: RoleCounts {
                harvesters,
                upgraders: 0,
                builders: 0,
            },
            goal_progress: 0,
            goal_level: level,
            population_empty: harvesters == 0,
        }
    }

    #[test]
    fn test_baseline_detection() {
        assert!(obs(1, 0).at_baseline());
        assert!(!obs(2, 0).at_baseline());
        assert!(!obs(1, 1).at_baseline());
    }

    #[test]
    fn test_role_counts() {
        let counts = RoleCounts {
            harvesters: 2,
            upgraders: 1,
            builders: 0,
        };
        assert_eq!(counts.get(Role::Harvester), 2);
        assert_eq!(counts.get(Role::Builder), 0);
        assert_eq!(counts.total(), 3);
        assert!(!counts.is_empty());
    }
}
