//! Shared ring and ownership state
//!
//! Only the dispatch thread writes here. Anyone reading from another thread
//! takes the same lock the writer uses.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::messages::ServerMetrics;
use super::ring::Ring;
use crate::domain::{Balloon, BalloonId};

#[derive(Debug, Default)]
pub struct Topology {
    pub(crate) ring: Mutex<Ring>,
    pub(crate) balloons: Mutex<HashMap<BalloonId, Balloon>>,
    pub(crate) metrics: Mutex<ServerMetrics>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }
}
