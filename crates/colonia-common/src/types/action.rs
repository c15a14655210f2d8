//! Actions, worker roles, and body shapes
//!
//! An [`Action`] is an immutable decision value: wait, or spawn a worker of
//! some role with some body shape. The canonical [`std::fmt::Display`]
//! rendering of an action doubles as its Q-table key fragment, so it must
//! stay stable across versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single capability part of a worker body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Work,
    Carry,
    Move,
}

impl BodyPart {
    /// Fixed part vocabulary, in canonical order.
    pub const ALL: [BodyPart; 3] = [BodyPart::Work, BodyPart::Carry, BodyPart::Move];

    /// Energy cost of this part.
    pub fn cost(self) -> u32 {
        match self {
            BodyPart::Work => 100,
            BodyPart::Carry => 50,
            BodyPart::Move => 50,
        }
    }

    fn token(self) -> &'static str {
        match self {
            BodyPart::Work => "work",
            BodyPart::Carry => "carry",
            BodyPart::Move => "move",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Worker role drawn from the fixed role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Harvester,
    Upgrader,
    Builder,
}

impl Role {
    /// Fixed role set, in canonical order.
    pub const ALL: [Role; 3] = [Role::Harvester, Role::Upgrader, Role::Builder];

    /// Lowercase role name used in keys and logs.
    pub fn name(self) -> &'static str {
        match self {
            Role::Harvester => "harvester",
            Role::Upgrader => "upgrader",
            Role::Builder => "builder",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered, length-bounded sequence of body parts.
///
/// Every shape produced by the catalog starts from the basic
/// `[work, carry, move]` triple, so a catalog-built worker is viable by
/// construction. Shapes arriving from a checkpoint are not trusted and must
/// be re-checked with [`BodyShape::is_viable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyShape(Vec<BodyPart>);

impl BodyShape {
    /// The minimal viable body: one work, one carry, one move part.
    pub fn basic() -> Self {
        BodyShape(vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move])
    }

    /// The basic body extended with the given extra parts.
    pub fn extended(extra: &[BodyPart]) -> Self {
        let mut parts = vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move];
        parts.extend_from_slice(extra);
        BodyShape(parts)
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.0
    }

    /// Total energy cost of the shape.
    pub fn cost(&self) -> u32 {
        self.0.iter().map(|p| p.cost()).sum()
    }

    /// Number of parts of the given kind.
    pub fn count(&self, part: BodyPart) -> usize {
        self.0.iter().filter(|p| **p == part).count()
    }

    /// A worker needs at least one of each part kind to function.
    pub fn is_viable(&self) -> bool {
        BodyPart::ALL.iter().all(|p| self.count(*p) > 0)
    }
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// One decision value handed to the world collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Wait,
    Spawn { role: Role, body: BodyShape },
}

impl Action {
    pub fn is_wait(&self) -> bool {
        matches!(self, Action::Wait)
    }

    /// Energy cost of executing the action (zero for waiting).
    pub fn cost(&self) -> u32 {
        match self {
            Action::Wait => 0,
            Action::Spawn { body, .. } => body.cost(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Wait => f.write_str("WAIT"),
            Action::Spawn { role, body } => write!(f, "SPAWN|{role}|{body}"),
        }
    }
}
