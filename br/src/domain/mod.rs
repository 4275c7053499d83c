//! Domain records for the screen ring
//!
//! Screens and balloons are plain state records; only the coordination
//! server mutates them.

mod balloon;
mod direction;
mod id;
mod screen;

pub use balloon::Balloon;
pub use direction::Direction;
pub use id::{BalloonId, ScreenId};
pub use screen::{Screen, ScreenInfo};
