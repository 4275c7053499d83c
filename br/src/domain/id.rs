//! Monotonic integer identities for screens and balloons

use serde::{Deserialize, Serialize};

/// Identity of a screen in the ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(pub u64);

/// Identity of a balloon
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalloonId(pub u64);

impl ScreenId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl BalloonId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Even ids start moving right, odd ids start moving left
    pub fn is_even(self) -> bool {
        self.0 % 2 == 0
    }
}

impl std::fmt::Display for ScreenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "screen-{}", self.0)
    }
}

impl std::fmt::Display for BalloonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "balloon-{}", self.0)
    }
}
