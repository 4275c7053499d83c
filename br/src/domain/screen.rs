//! Screen ring member

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::id::ScreenId;
use crate::server::Message;
use crate::sync::{BoundedBlockingQueue, SyncError};

/// One networked display in the ring
///
/// Cloning a screen shares its outbound queue.
#[derive(Debug, Clone)]
pub struct Screen {
    id: ScreenId,
    peer: String,
    outbound: Arc<BoundedBlockingQueue<Message>>,
}

/// Read-only view of a screen for status queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenInfo {
    pub id: ScreenId,
    pub peer: String,
    /// Messages waiting on the outbound queue
    pub pending: usize,
}

impl Screen {
    pub fn new(id: ScreenId, peer: impl Into<String>, outbound_capacity: usize) -> Result<Self, SyncError> {
        Ok(Self {
            id,
            peer: peer.into(),
            outbound: Arc::new(BoundedBlockingQueue::new(outbound_capacity)?),
        })
    }

    pub fn id(&self) -> ScreenId {
        self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Queue drained by the screen's wire writer
    pub fn outbound(&self) -> &Arc<BoundedBlockingQueue<Message>> {
        &self.outbound
    }

    /// Push a notification to this screen
    ///
    /// Blocks while the outbound queue is full, so a stalled screen stalls
    /// its caller.
    pub fn deliver(&self, message: Message) {
        debug!(screen = %self.id, kind = message.kind.name(), "Screen::deliver: called");
        self.outbound.enqueue(message);
    }

    pub fn info(&self) -> ScreenInfo {
        ScreenInfo {
            id: self.id,
            peer: self.peer.clone(),
            pending: self.outbound.count(),
        }
    }
}
