//! Legal-action catalog generation
//!
//! The catalog is regenerated deterministically each tick, never mutated in
//! place. At goal level 1 only basic harvester/upgrader spawns are offered;
//! from level 2 on, every role may be spawned with any extended body shape.
//! `Wait` is always appended last, so value ties on an untrained table break
//! toward the first spawn combination.

use serde::{Deserialize, Serialize};

use crate::types::action::{Action, BodyPart, BodyShape, Role};
use crate::BODY_EXTRA_PARTS;

/// Context the catalog depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogContext {
    pub goal_level: u8,
}

/// All combinations with repetition of `len` parts from `parts`, in
/// enumeration order. `len` is capped at [`BODY_EXTRA_PARTS`] so the output
/// stays strictly bounded.
pub fn body_combinations(parts: &[BodyPart], len: usize) -> Vec<Vec<BodyPart>> {
    let len = len.min(BODY_EXTRA_PARTS);
    let mut combos = Vec::new();
    let mut buf = Vec::with_capacity(len);
    combine(parts, 0, len, &mut buf, &mut combos);
    combos
}

fn combine(
    parts: &[BodyPart],
    start: usize,
    len: usize,
    buf: &mut Vec<BodyPart>,
    out: &mut Vec<Vec<BodyPart>>,
) {
    if buf.len() == len {
        out.push(buf.clone());
        return;
    }
    for i in start..parts.len() {
        buf.push(parts[i]);
        combine(parts, i, len, buf, out);
        buf.pop();
    }
}

/// The legal actions for the given context. Pure and deterministic; the
/// result is strictly bounded. Callers must treat an empty catalog as "no
/// legal action, behave as `Wait`".
pub fn legal_actions(ctx: &CatalogContext) -> Vec<Action> {
    let mut actions = Vec::new();
    if ctx.goal_level <= 1 {
        for role in [Role::Harvester, Role::Upgrader] {
            actions.push(Action::Spawn {
                role,
                body: BodyShape::basic(),
            });
        }
    } else {
        for extra in body_combinations(&BodyPart::ALL, BODY_EXTRA_PARTS) {
            for role in Role::ALL {
                actions.push(Action::Spawn {
                    role,
                    body: BodyShape::extended(&extra),
                });
            }
        }
    }
    actions.push(Action::Wait);
    actions
}

/// Level-independent union of every action any catalog can produce, used as
/// the gene domain of an evolutionary chromosome. Order is stable: per role,
/// the basic body first, then each extended shape; `Wait` last.
pub fn alphabet() -> Vec<Action> {
    let mut actions = Vec::new();
    let extras = body_combinations(&BodyPart::ALL, BODY_EXTRA_PARTS);
    for role in Role::ALL {
        actions.push(Action::Spawn {
            role,
            body: BodyShape::basic(),
        });
        for extra in &extras {
            actions.push(Action::Spawn {
                role,
                body: BodyShape::extended(extra),
            });
        }
    }
    actions.push(Action::Wait);
    actions
}

/// Position of an action in an action list, if present.
pub fn index_of(actions: &[Action], action: &Action) -> Option<usize> {
    actions.iter().position(|a| a == action)
}
