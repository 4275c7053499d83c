//! ServerHandle - producer and query interface to the coordination server

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::error::ServerError;
use super::messages::{Flight, Message, Origin, ScreenLink, ServerMetrics};
use super::topology::Topology;
use crate::domain::{Balloon, BalloonId, ScreenId, ScreenInfo};
use crate::sync::BoundedBlockingQueue;

/// Cloneable handle for producers and status readers
///
/// Every enqueue may block while the inbound queue is full.
#[derive(Clone)]
pub struct ServerHandle {
    inbound: Arc<BoundedBlockingQueue<Message>>,
    topology: Arc<Topology>,
}

impl ServerHandle {
    pub(crate) fn new(inbound: Arc<BoundedBlockingQueue<Message>>, topology: Arc<Topology>) -> Self {
        Self { inbound, topology }
    }

    /// Put a message on the inbound queue as-is
    pub fn enqueue(&self, message: Message) {
        debug!(kind = message.kind.name(), sender = ?message.sender, "ServerHandle::enqueue: called");
        self.inbound.enqueue(message);
    }

    /// Put a message on the inbound queue, overwriting its sender
    pub fn enqueue_as(&self, message: Message, sender: Origin) {
        self.enqueue(message.sent_by(sender));
    }

    pub fn connect(&self, link: impl ScreenLink) {
        self.enqueue(Message::connected(link));
    }

    pub fn disconnect(&self, screen: ScreenId) {
        self.enqueue(Message::disconnected(screen));
    }

    /// Report that a balloon is leaving `screen`
    pub fn change_screen(&self, screen: ScreenId, flight: Flight) {
        self.enqueue_as(Message::change_screen(flight), Origin::Screen(screen));
    }

    pub fn new_balloon(&self, flight: Flight) {
        self.enqueue(Message::new_balloon(flight));
    }

    pub fn pop_balloon(&self, balloon: BalloonId) {
        self.enqueue(Message::pop_balloon(balloon));
    }

    /// Ask the dispatch loop to stop after the messages already queued
    pub fn shutdown(&self, reason: impl Into<String>) {
        self.enqueue(Message::shutdown(reason));
    }

    /// Look up a balloon; a missing id is an error
    pub fn balloon(&self, id: BalloonId) -> Result<Balloon, ServerError> {
        self.topology
            .balloons
            .lock()
            .get(&id)
            .copied()
            .ok_or(ServerError::BalloonNotFound(id))
    }

    pub fn screen(&self, id: ScreenId) -> Option<ScreenInfo> {
        self.topology.ring.lock().get(id).map(|s| s.info())
    }

    /// Snapshot of the ownership table
    pub fn balloons(&self) -> HashMap<BalloonId, Balloon> {
        self.topology.balloons.lock().clone()
    }

    /// Screen ids in ring order
    pub fn ring(&self) -> Vec<ScreenId> {
        self.topology.ring.lock().ids()
    }

    pub fn metrics(&self) -> ServerMetrics {
        self.topology.metrics.lock().clone()
    }

    /// Messages waiting for the dispatch loop
    pub fn pending(&self) -> usize {
        self.inbound.count()
    }
}

impl std::fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandle").field("pending", &self.pending()).finish()
    }
}
