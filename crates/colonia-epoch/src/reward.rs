//! Reward shaping for spawn decisions
//!
//! Every decision starts at a small negative baseline so idling is never
//! free. Affordable spawns earn a bonus scaled by work parts, role-balance
//! bonuses and penalties steer the early economy, goal progress pays out
//! per unit, and a malformed worker costs heavily. An unaffordable spawn
//! earns nothing extra: the action silently no-ops at the effect layer and
//! this shortfall is its penalty.

use tracing::debug;

use colonia_common::{
    Action, BodyPart, Observation, Role, BASIC_BODY_COST, MALFORMED_WORKER_PENALTY,
};

/// Everything reward shaping looks at for one decision.
#[derive(Debug, Clone, Copy)]
pub struct RewardContext<'a> {
    pub obs: &'a Observation,
    pub action: &'a Action,
    /// Goal-progress units gained since the previous decision.
    pub progress_delta: u64,
    /// Malformed workers removed by the collaborator this tick.
    pub malformed_workers: u16,
}

/// Shaped reward for one decision.
pub fn shape(ctx: &RewardContext<'_>) -> f64 {
    let mut reward = -1.0;
    let workers = ctx.obs.workers;

    match ctx.action {
        Action::Spawn { role, body } => {
            if ctx.obs.energy_available >= body.cost() {
                reward += 5.0 + 2.0 * body.count(BodyPart::Work) as f64;
                match role {
                    Role::Builder => {
                        if workers.harvesters == 0 {
                            debug!("builder spawned with no harvesters");
                            reward -= 15.0;
                        } else if workers.harvesters < 2 && ctx.obs.goal_level >= 2 {
                            reward -= 8.0;
                        }
                    }
                    Role::Harvester => {
                        if workers.harvesters < 2 {
                            reward += 5.0;
                        }
                    }
                    Role::Upgrader => {
                        if workers.upgraders == 0 && workers.harvesters >= 1 {
                            reward += 3.0;
                        }
                    }
                }
            }
        }
        Action::Wait => {
            // Waiting on a full energy reserve wastes time.
            if ctx.obs.energy_available >= BASIC_BODY_COST {
                reward -= 1.0;
            }
        }
    }

    if workers.builders > 0 && workers.harvesters == 0 {
        reward -= 5.0;
    }

    reward += 2.0 * ctx.progress_delta as f64;
    reward += MALFORMED_WORKER_PENALTY * ctx.malformed_workers as f64;
    reward
}
