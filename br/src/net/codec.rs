//! JSON-lines wire format
//!
//! Each frame is one JSON object on its own line, tagged by `type`:
//! `{"type":"change-screen","balloon":5,"direction":"right","y":0.3,"velocity":0.25}`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{BalloonId, ScreenId};
use crate::server::{Flight, Message, MessageKind, Origin};

/// Maximum frame size in bytes, newline excluded
pub const MAX_FRAME_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Frame too large: {0} bytes")]
    TooLarge(usize),

    #[error("Frame not accepted from a screen: {0}")]
    Unexpected(&'static str),
}

/// Frames exchanged with a screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Frame {
    /// First frame a screen receives, naming its id
    Welcome { screen: ScreenId },
    ChangeScreen(Flight),
    NewBalloon(Flight),
    PopBalloon { balloon: BalloonId },
}

impl Frame {
    /// Frame for a message on a screen's outbound queue, if it has one
    pub fn from_outbound(message: &Message) -> Option<Self> {
        match &message.kind {
            MessageKind::NewBalloon(flight) => Some(Self::NewBalloon(*flight)),
            MessageKind::PopBalloon(balloon) => Some(Self::PopBalloon { balloon: *balloon }),
            _ => None,
        }
    }

    /// Message for the server from a frame `screen` sent
    pub fn into_inbound(self, screen: ScreenId) -> Result<Message, CodecError> {
        let message = match self {
            Self::ChangeScreen(flight) => Message::change_screen(flight),
            Self::NewBalloon(flight) => Message::new_balloon(flight),
            Self::PopBalloon { balloon } => Message::pop_balloon(balloon),
            Self::Welcome { .. } => return Err(CodecError::Unexpected("welcome")),
        };
        Ok(message.sent_by(Origin::Screen(screen)))
    }
}

/// Serialize a frame as one line, newline included
pub fn encode(frame: &Frame) -> Result<String, CodecError> {
    let mut line = serde_json::to_string(frame)?;
    line.push('\n');
    Ok(line)
}

/// Parse one line into a frame
pub fn decode(line: &str) -> Result<Frame, CodecError> {
    let line = line.trim_end();
    if line.len() > MAX_FRAME_SIZE {
        return Err(CodecError::TooLarge(line.len()));
    }
    Ok(serde_json::from_str(line)?)
}
