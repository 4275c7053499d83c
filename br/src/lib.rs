//! balloonring - coordination server for a ring of balloon screens
//!
//! Screens connect over TCP and are arranged in a logical ring. Balloons
//! drift across a screen and, on reaching its left or right edge, are handed
//! to the neighbor on that side. One dispatch thread owns the ring and the
//! balloon table; everything else talks to it through a bounded blocking
//! queue.
//!
//! # Modules
//!
//! - [`sync`] - Predicate-guarded conditions and the bounded blocking queue
//! - [`domain`] - Screen and balloon records, ids, directions
//! - [`server`] - The dispatch loop, ring topology, and query handle
//! - [`net`] - Acceptor, per-screen TCP links, JSON-lines framing
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod net;
pub mod server;
pub mod sync;

pub use config::Config;
pub use domain::{Balloon, BalloonId, Direction, Screen, ScreenId};
pub use server::{CoordinationServer, Message, ServerConfig, ServerHandle};
pub use sync::{BoundedBlockingQueue, Condition};
