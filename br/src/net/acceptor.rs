//! Acceptor - turns inbound TCP connections into `Connected` messages

use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use super::link::TcpLink;
use crate::server::ServerHandle;

pub struct Acceptor {
    listener: TcpListener,
}

impl Acceptor {
    /// Bind the listening socket
    pub fn bind(addr: &str) -> Result<Self> {
        debug!(%addr, "Acceptor::bind: called");
        let listener = TcpListener::bind(addr).context(format!("Failed to bind {}", addr))?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().context("Failed to read listener address")
    }

    /// Accept connections forever
    ///
    /// A failed accept is logged and accepting resumes.
    pub fn run(self, server: ServerHandle) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(%addr, "Accepting screens");
        }
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let link = TcpLink::new(stream);
                    debug!(peer = %link.peer_addr(), "Acceptor::run: accepted");
                    server.connect(link);
                }
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                }
            }
        }
    }

    /// Run the accept loop on its own thread
    pub fn spawn(self, server: ServerHandle) -> Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("acceptor".to_string())
            .spawn(move || self.run(server))
            .context("Failed to spawn acceptor thread")
    }
}
