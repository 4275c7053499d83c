//! Coordination server configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Coordination server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Capacity of the inbound message queue
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of each screen's outbound queue
    #[serde(rename = "outbound-capacity", default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Balloons created for every newly connected screen
    #[serde(rename = "balloons-per-screen", default = "default_balloons_per_screen")]
    pub balloons_per_screen: usize,

    /// Horizontal speed given to balloons the server creates or redistributes
    #[serde(rename = "balloon-velocity", default = "default_balloon_velocity")]
    pub balloon_velocity: f64,

    /// Vertical position given to balloons redistributed from a departed screen
    #[serde(rename = "reset-y", default = "default_reset_y")]
    pub reset_y: f64,

    /// Hand orphaned balloons to the next screen that connects
    #[serde(rename = "adopt-orphans", default = "default_adopt_orphans")]
    pub adopt_orphans: bool,

    /// Seed for the screen/neighbor picker; random when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_queue_capacity() -> usize {
    debug!("default_queue_capacity: called");
    64
}

fn default_outbound_capacity() -> usize {
    debug!("default_outbound_capacity: called");
    64
}

fn default_balloons_per_screen() -> usize {
    debug!("default_balloons_per_screen: called");
    4
}

fn default_balloon_velocity() -> f64 {
    debug!("default_balloon_velocity: called");
    0.25
}

fn default_reset_y() -> f64 {
    debug!("default_reset_y: called");
    0.5
}

fn default_adopt_orphans() -> bool {
    debug!("default_adopt_orphans: called");
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        debug!("ServerConfig::default: called");
        Self {
            queue_capacity: 64,
            outbound_capacity: 64,
            balloons_per_screen: 4,
            balloon_velocity: 0.25,
            reset_y: 0.5,
            adopt_orphans: true,
            seed: None,
        }
    }
}

impl ServerConfig {
    /// Vertical start position of the `index`th of `count` balloons, spread evenly
    pub fn spread_y(index: usize, count: usize) -> f64 {
        (index + 1) as f64 / (count + 1) as f64
    }
}
