//! TcpLink - one screen's connection, split into reader and writer threads

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::thread;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use super::codec::{Frame, MAX_FRAME_SIZE, decode, encode};
use crate::domain::{Screen, ScreenId};
use crate::server::{Message, ScreenLink, ServerHandle};
use crate::sync::BoundedBlockingQueue;

/// Accepted TCP connection waiting to become a screen
pub struct TcpLink {
    stream: TcpStream,
    peer: String,
}

impl TcpLink {
    pub fn new(stream: TcpStream) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        Self { stream, peer }
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer
    }
}

impl ScreenLink for TcpLink {
    fn peer(&self) -> String {
        self.peer.clone()
    }

    fn attach(self: Box<Self>, screen: &Screen, server: ServerHandle) -> Result<()> {
        let TcpLink { stream, peer } = *self;
        let id = screen.id();
        debug!(%id, %peer, "TcpLink::attach: called");
        let reader = stream.try_clone().context("Failed to clone screen stream")?;
        let outbound = screen.outbound().clone();

        thread::Builder::new()
            .name(format!("screen-{}-writer", id.0))
            .spawn(move || write_loop(stream, outbound, id))
            .context("Failed to spawn screen writer")?;

        // on error the server stops the writer when it drops the screen
        thread::Builder::new()
            .name(format!("screen-{}-reader", id.0))
            .spawn(move || read_loop(reader, id, server))
            .context("Failed to spawn screen reader")?;
        Ok(())
    }
}

/// Drain the outbound queue onto the socket until the server says stop
///
/// After a write error the loop keeps draining and discarding so the
/// dispatch thread never blocks on a dead screen.
fn write_loop(mut stream: TcpStream, outbound: Arc<BoundedBlockingQueue<Message>>, screen: ScreenId) {
    let mut healthy = match write_frame(&mut stream, &Frame::Welcome { screen }) {
        Ok(()) => true,
        Err(e) => {
            warn!(%screen, error = %e, "Failed to greet screen");
            let _ = stream.shutdown(Shutdown::Both);
            false
        }
    };

    loop {
        let message = outbound.dequeue();
        if message.is_shutdown() {
            break;
        }
        if !healthy {
            continue;
        }
        let Some(frame) = Frame::from_outbound(&message) else {
            continue;
        };
        if let Err(e) = write_frame(&mut stream, &frame) {
            warn!(%screen, error = %e, "Write to screen failed");
            let _ = stream.shutdown(Shutdown::Both);
            healthy = false;
        }
    }
    debug!(%screen, "write_loop: stopped");
}

fn write_frame(stream: &mut TcpStream, frame: &Frame) -> Result<()> {
    let line = encode(frame)?;
    stream.write_all(line.as_bytes()).context("Failed to write frame")?;
    stream.flush().context("Failed to flush frame")?;
    Ok(())
}

/// Feed frames from the socket to the server until it closes or misbehaves
///
/// At most `MAX_FRAME_SIZE` bytes plus the newline are buffered per frame; a
/// longer line drops the screen.
fn read_loop(stream: TcpStream, screen: ScreenId, server: ServerHandle) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::with_capacity(MAX_FRAME_SIZE + 1);
    loop {
        buf.clear();
        let limit = (MAX_FRAME_SIZE + 1) as u64;
        match (&mut reader).take(limit).read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(%screen, error = %e, "read_loop: read failed");
                break;
            }
        }
        if buf.last() != Some(&b'\n') && buf.len() > MAX_FRAME_SIZE {
            warn!(%screen, limit = MAX_FRAME_SIZE, "Dropping screen after oversized frame");
            break;
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                warn!(%screen, error = %e, "Dropping screen after non-UTF-8 frame");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode(line).and_then(|frame| frame.into_inbound(screen)) {
            Ok(message) => server.enqueue(message),
            Err(e) => {
                warn!(%screen, error = %e, "Dropping screen after bad frame");
                break;
            }
        }
    }

    let _ = reader.get_ref().shutdown(Shutdown::Both);
    info!(%screen, "Screen connection closed");
    server.disconnect(screen);
}
