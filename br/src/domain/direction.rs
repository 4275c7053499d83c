//! Horizontal direction of travel

use serde::{Deserialize, Serialize};

/// Which edge of a screen a balloon leaves through or enters from
///
/// In a hand-off request the direction names the exit edge; in a new balloon
/// notification it names the entry edge, which is why forwarding flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    /// Neither left nor right; no neighbor can be resolved
    #[default]
    #[serde(other)]
    Unspecified,
}

impl Direction {
    /// Swap Left and Right; Unspecified stays as it is
    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Unspecified => Self::Unspecified,
        }
    }

    /// Signed horizontal velocity for a balloon entering from this edge
    ///
    /// Entering from the left edge means travelling right.
    pub fn entry_velocity(self, speed: f64) -> f64 {
        match self {
            Self::Left => speed.abs(),
            Self::Right => -speed.abs(),
            Self::Unspecified => 0.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Unspecified => write!(f, "unspecified"),
        }
    }
}
