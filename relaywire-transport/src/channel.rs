// SPDX-FileCopyrightText: 2026 Relaywire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Channel Trait
//!
//! One capability interface over both connection backends. The backend is
//! chosen once, when the channel is opened; after that the caller drives
//! the same four operations regardless of whether bytes cross a raw
//! descriptor or a secure session.

use crate::error::TransportResult;
use crate::tcp::TcpChannel;
#[cfg(feature = "tls")]
use crate::tls::{TlsChannel, TlsContext};

/// An open connection endpoint.
///
/// A channel is exclusively owned from the moment [`open`] returns it
/// until [`close`](Channel::close) consumes it. It is `Send` but not
/// `Sync`: driving one channel from several threads requires the caller
/// to supply its own ordering (a mutex, or a single owning thread).
///
/// All data-path methods are non-blocking. [`send_all`](Channel::send_all)
/// busy-retries transient not-ready conditions until every byte is
/// accepted; [`recv_available`](Channel::recv_available) drains what is
/// ready and returns immediately. Neither sleeps - backoff under
/// sustained congestion belongs to the caller.
pub trait Channel: Send {
    /// Sends the whole buffer.
    ///
    /// On success the returned count always equals `buf.len()` - never a
    /// short count. On failure no partial count is reported, even if a
    /// prefix of the buffer already reached the peer.
    fn send_all(&mut self, buf: &[u8]) -> TransportResult<usize>;

    /// Drains whatever is immediately available into `buf`.
    ///
    /// Returns the number of bytes received, which is legitimately zero
    /// on an idle connection. Never blocks waiting for more data and
    /// never writes outside `buf`.
    fn recv_available(&mut self, buf: &mut [u8]) -> TransportResult<usize>;

    /// Human-readable `address:port` of the connected peer.
    fn peer_endpoint(&self) -> String;

    /// Consumes the channel, releasing the descriptor or the secure
    /// session after a best-effort orderly shutdown.
    ///
    /// Calling any operation afterwards - or closing twice - is ruled
    /// out by ownership rather than checked at runtime.
    fn close(self: Box<Self>);
}

/// Opens a connection to `host:port` and returns the channel handle.
///
/// Resolves the host into an ordered candidate list and connects to the
/// first endpoint that accepts. With a [`TlsContext`] the connection is
/// wrapped in a secure session: the TLS handshake runs under the
/// context's wall-clock deadline and the peer certificate chain must
/// verify fully against the context's trust store.
///
/// # Errors
///
/// [`Resolution`](crate::TransportError::Resolution) when the name does
/// not resolve, [`Connect`](crate::TransportError::Connect) when every
/// candidate endpoint refuses, and for TLS connections
/// [`TlsHandshake`](crate::TransportError::TlsHandshake) or
/// [`CertificateVerification`](crate::TransportError::CertificateVerification).
#[cfg(feature = "tls")]
pub fn open(
    host: &str,
    port: u16,
    tls: Option<&TlsContext>,
) -> TransportResult<Box<dyn Channel>> {
    match tls {
        None => Ok(Box::new(TcpChannel::open(host, port)?)),
        Some(ctx) => Ok(Box::new(TlsChannel::open(host, port, ctx)?)),
    }
}

/// Opens a plain connection to `host:port` and returns the channel
/// handle. The `tls` feature is disabled in this build, so no secure
/// backend is available.
#[cfg(not(feature = "tls"))]
pub fn open(host: &str, port: u16) -> TransportResult<Box<dyn Channel>> {
    Ok(Box::new(TcpChannel::open(host, port)?))
}
