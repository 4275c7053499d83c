//! TCP plumbing between screens and the coordination server
//!
//! The acceptor turns each accepted connection into a `Connected` message;
//! once the server attaches the link, a reader thread feeds decoded frames
//! into the server and a writer thread drains the screen's outbound queue.

mod acceptor;
mod codec;
mod link;

pub use acceptor::Acceptor;
pub use codec::{CodecError, Frame, MAX_FRAME_SIZE, decode, encode};
pub use link::TcpLink;
