//! Coordination server errors

use thiserror::Error;

use crate::domain::{BalloonId, ScreenId};
use crate::sync::SyncError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Balloon not found: {0}")]
    BalloonNotFound(BalloonId),

    #[error("Screen already in ring: {0}")]
    DuplicateScreen(ScreenId),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
