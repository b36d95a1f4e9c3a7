//! Actions the core hands back to the connector.
//!
//! A turn yields at most one [`Action`]. Paths travel as compact `udlr`
//! strings, matching the game protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::geometry::{Direction, Position};
use crate::item::WeaponClass;

/// A sequence of single-cell steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Path(Vec<Direction>);

impl Path {
    /// Build a path from steps.
    #[must_use]
    pub fn new(steps: Vec<Direction>) -> Self {
        Self(steps)
    }

    /// Parse a wire string such as `"uurd"`.
    pub fn parse(encoded: &str) -> Result<Self> {
        encoded
            .chars()
            .map(|c| {
                Direction::from_char(c).ok_or_else(|| {
                    AgentError::MalformedPath(format!("unexpected step '{c}' in \"{encoded}\""))
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the path has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The steps.
    #[must_use]
    pub fn steps(&self) -> &[Direction] {
        &self.0
    }

    /// First step, if any.
    #[must_use]
    pub fn first(&self) -> Option<Direction> {
        self.0.first().copied()
    }

    /// Cell reached by walking the whole path from `from`.
    #[must_use]
    pub fn destination(&self, from: Position) -> Position {
        self.0.iter().fold(from, |at, step| at.step(*step))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.0 {
            write!(f, "{}", step.as_char())?;
        }
        Ok(())
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for Path {
    type Error = AgentError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl FromIterator<Direction> for Path {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One command for the connector to execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Walk along a path.
    Move {
        /// Steps to take.
        path: Path,
    },
    /// Melee strike (also used on obstacles).
    Attack {
        /// Facing.
        direction: Direction,
    },
    /// Fire the gun.
    Shoot {
        /// Facing.
        direction: Direction,
    },
    /// Throw the throwable.
    Throw {
        /// Facing.
        direction: Direction,
    },
    /// Use the special weapon.
    UseSpecial {
        /// Facing.
        direction: Direction,
    },
    /// Pick up whatever lies on the agent's cell.
    PickUp,
    /// Drop a held item to free its slot.
    Revoke {
        /// Item to drop.
        item_id: String,
    },
    /// Use a consumable.
    Consume {
        /// Consumable to use.
        item_id: String,
    },
}

impl Action {
    /// The firing action for a weapon of `class`.
    #[must_use]
    pub const fn fire(class: WeaponClass, direction: Direction) -> Self {
        match class {
            WeaponClass::Gun => Self::Shoot { direction },
            WeaponClass::Throwable => Self::Throw { direction },
            WeaponClass::Special => Self::UseSpecial { direction },
            WeaponClass::Melee => Self::Attack { direction },
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::Shoot { .. } => "shoot",
            Self::Throw { .. } => "throw",
            Self::UseSpecial { .. } => "use_special",
            Self::PickUp => "pick_up",
            Self::Revoke { .. } => "revoke",
            Self::Consume { .. } => "consume",
        }
    }
}
