//! Message types for the coordination server

use serde::{Deserialize, Serialize};

use super::handle::ServerHandle;
use crate::domain::{BalloonId, Direction, Screen, ScreenId};

/// Opaque connection handle carried by a `Connected` message
///
/// The server calls [`attach`](ScreenLink::attach) once the new screen is in
/// the ring, handing over the screen (and its outbound queue) so the link can
/// start moving bytes. Attach must not block the dispatch thread, and must
/// not enqueue onto the server itself. An error takes the screen back out of
/// the ring.
pub trait ScreenLink: Send + 'static {
    /// Human readable peer description for logs and status
    fn peer(&self) -> String;

    fn attach(self: Box<Self>, screen: &Screen, server: ServerHandle) -> eyre::Result<()>;
}

/// Balloon payload of hand-off and creation messages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub balloon: BalloonId,
    #[serde(default)]
    pub direction: Direction,
    pub y: f64,
    pub velocity: f64,
}

/// Who put a message on a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    Server,
    Acceptor,
    Screen(ScreenId),
    #[default]
    External,
}

impl Origin {
    pub fn screen(self) -> Option<ScreenId> {
        match self {
            Self::Screen(id) => Some(id),
            _ => None,
        }
    }
}

/// What a message asks the server (or a screen) to do
pub enum MessageKind {
    /// A new screen connection was accepted
    Connected(Box<dyn ScreenLink>),

    /// A screen's connection closed
    Disconnected(ScreenId),

    /// A balloon is leaving the sender's screen through `direction`
    ChangeScreen(Flight),

    /// A balloon should appear on a screen, entering from `direction`
    NewBalloon(Flight),

    /// A balloon is gone for good
    PopBalloon(BalloonId),

    /// Terminal message; stops whichever loop dequeues it
    Shutdown { reason: String },
}

impl MessageKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::Disconnected(_) => "disconnected",
            Self::ChangeScreen(_) => "change-screen",
            Self::NewBalloon(_) => "new-balloon",
            Self::PopBalloon(_) => "pop-balloon",
            Self::Shutdown { .. } => "shutdown",
        }
    }
}

impl std::fmt::Debug for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(link) => f.debug_tuple("Connected").field(&link.peer()).finish(),
            Self::Disconnected(id) => f.debug_tuple("Disconnected").field(id).finish(),
            Self::ChangeScreen(flight) => f.debug_tuple("ChangeScreen").field(flight).finish(),
            Self::NewBalloon(flight) => f.debug_tuple("NewBalloon").field(flight).finish(),
            Self::PopBalloon(id) => f.debug_tuple("PopBalloon").field(id).finish(),
            Self::Shutdown { reason } => f.debug_struct("Shutdown").field("reason", reason).finish(),
        }
    }
}

/// A unit of work on the inbound or an outbound queue
///
/// Only `sender` may change after the message is built.
#[derive(Debug)]
pub struct Message {
    pub sender: Origin,
    pub kind: MessageKind,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            sender: Origin::default(),
            kind,
        }
    }

    pub fn connected(link: impl ScreenLink) -> Self {
        Self::new(MessageKind::Connected(Box::new(link))).sent_by(Origin::Acceptor)
    }

    pub fn disconnected(screen: ScreenId) -> Self {
        Self::new(MessageKind::Disconnected(screen)).sent_by(Origin::Screen(screen))
    }

    pub fn change_screen(flight: Flight) -> Self {
        Self::new(MessageKind::ChangeScreen(flight))
    }

    pub fn new_balloon(flight: Flight) -> Self {
        Self::new(MessageKind::NewBalloon(flight))
    }

    pub fn pop_balloon(balloon: BalloonId) -> Self {
        Self::new(MessageKind::PopBalloon(balloon))
    }

    pub fn shutdown(reason: impl Into<String>) -> Self {
        Self::new(MessageKind::Shutdown { reason: reason.into() })
    }

    /// Replace the sender
    pub fn sent_by(mut self, sender: Origin) -> Self {
        self.sender = sender;
        self
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self.kind, MessageKind::Shutdown { .. })
    }
}

/// Server counters for status output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerMetrics {
    pub messages_received: u64,
    pub messages_forwarded: u64,
    pub messages_dropped: u64,
    pub screens: usize,
    pub balloons: usize,
    pub orphans: usize,
}
