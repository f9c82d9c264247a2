// SPDX-FileCopyrightText: 2026 Relaywire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Plain TCP Backend
//!
//! Channel over a raw descriptor in non-blocking mode. Resolution and
//! candidate iteration live here and are shared with the TLS backend.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use tracing::{debug, trace};

use crate::channel::Channel;
use crate::error::{TransportError, TransportResult};
use crate::io::{recv_available, send_all};

/// Resolves `host:port` and connects to the first candidate endpoint
/// that accepts. Candidates are tried in resolver order, both address
/// families.
pub(crate) fn connect_stream(host: &str, port: u16) -> TransportResult<(TcpStream, SocketAddr)> {
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|e| TransportError::Resolution(format!("{host}:{port}: {e}")))?
        .collect();
    if candidates.is_empty() {
        return Err(TransportError::Resolution(format!(
            "{host}:{port}: resolver returned no addresses"
        )));
    }
    debug!(host, port, candidates = candidates.len(), "resolved");

    let mut last_err: Option<io::Error> = None;
    for addr in &candidates {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                debug!(peer = %addr, "connected");
                return Ok((stream, *addr));
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(TransportError::Connect(format!(
        "{host}:{port}: {}",
        last_err.map_or_else(|| "no candidates".to_string(), |e| e.to_string())
    )))
}

/// Plain (non-TLS) channel.
///
/// The descriptor is switched to non-blocking mode at open time, so no
/// later call on this channel can park the calling thread in the kernel.
pub struct TcpChannel {
    stream: TcpStream,
    peer_addr: SocketAddr,
}

impl TcpChannel {
    /// Connects to `host:port` and prepares the descriptor.
    ///
    /// Nagle's algorithm is disabled: protocol traffic is small framed
    /// messages that must not sit in a coalescing buffer.
    pub fn open(host: &str, port: u16) -> TransportResult<Self> {
        let (stream, peer_addr) = connect_stream(host, port)?;
        stream
            .set_nodelay(true)
            .map_err(|e| TransportError::Socket(e.to_string()))?;
        stream
            .set_nonblocking(true)
            .map_err(|e| TransportError::Socket(e.to_string()))?;
        Ok(TcpChannel { stream, peer_addr })
    }
}

impl Channel for TcpChannel {
    fn send_all(&mut self, buf: &[u8]) -> TransportResult<usize> {
        let sent = send_all(&mut self.stream, buf)?;
        trace!(peer = %self.peer_addr, bytes = sent, "send complete");
        Ok(sent)
    }

    fn recv_available(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let received = recv_available(&mut self.stream, buf)?;
        trace!(peer = %self.peer_addr, bytes = received, "drained");
        Ok(received)
    }

    fn peer_endpoint(&self) -> String {
        self.peer_addr.to_string()
    }

    fn close(self: Box<Self>) {
        debug!(peer = %self.peer_addr, "closing channel");
        let _ = self.stream.shutdown(Shutdown::Both); // Ignore errors on close
    }
}
