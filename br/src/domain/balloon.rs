//! Balloon ownership record

use serde::{Deserialize, Serialize};

use super::id::{BalloonId, ScreenId};

/// A balloon and the screen currently displaying it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balloon {
    pub id: BalloonId,
    /// `None` while the balloon is orphaned
    pub owner: Option<ScreenId>,
}

impl Balloon {
    pub fn new(id: BalloonId, owner: ScreenId) -> Self {
        Self { id, owner: Some(owner) }
    }

    pub fn is_orphan(&self) -> bool {
        self.owner.is_none()
    }

    pub fn is_owned_by(&self, screen: ScreenId) -> bool {
        self.owner == Some(screen)
    }
}
