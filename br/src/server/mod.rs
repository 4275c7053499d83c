//! Coordination server for the screen ring
//!
//! The server is the single source of truth for which screen owns which
//! balloon. All producers (the acceptor, per-screen readers, anyone holding a
//! [`ServerHandle`]) put [`Message`]s on one bounded queue; one dispatch
//! thread applies them in order:
//! - **Connected:** add a screen to the ring and give it fresh balloons
//! - **Disconnected:** hand the screen's balloons to its neighbors, or orphan them
//! - **ChangeScreen:** move a balloon to the neighbor it flew toward
//! - **NewBalloon / PopBalloon:** create or remove a balloon

mod config;
mod core;
mod error;
mod handle;
mod messages;
mod picker;
mod ring;
mod topology;

pub use config::ServerConfig;
pub use self::core::CoordinationServer;
pub use error::ServerError;
pub use handle::ServerHandle;
pub use messages::{Flight, Message, MessageKind, Origin, ScreenLink, ServerMetrics};
pub use picker::{Picker, RandomPicker, SequencePicker};
pub use ring::Ring;
pub use topology::Topology;
