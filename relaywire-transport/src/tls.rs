// SPDX-FileCopyrightText: 2026 Relaywire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! TLS Backend
//!
//! Channel over a `rustls` secure session, plus the [`TlsContext`] the
//! process owner constructs once and hands to every `open` call. The
//! context owns the trust store and all TLS-library state - there is no
//! process-global initialization to trip over.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::pki_types::ServerName;
use rustls::{ClientConnection, RootCertStore, StreamOwned};
use tracing::{debug, trace};

use crate::channel::Channel;
use crate::error::{TransportError, TransportResult};
use crate::io::{recv_available, send_all};
use crate::tcp::connect_stream;

/// Default wall-clock bound on the TLS handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide TLS configuration, built once and shared by reference
/// with every TLS `open` call.
///
/// Holds the verified trust store and the handshake deadline. Cloning is
/// cheap - the underlying client config is reference-counted.
#[derive(Clone)]
pub struct TlsContext {
    config: Arc<rustls::ClientConfig>,
    handshake_timeout: Duration,
}

impl TlsContext {
    /// Builds a context whose trust store is the PEM certificate bundle
    /// at `path`.
    ///
    /// The bundle must contain at least one parseable certificate;
    /// an unreadable, unparseable, or empty bundle is a
    /// [`TrustStore`](TransportError::TrustStore) error, not a reason to
    /// abort the process.
    pub fn from_ca_bundle(path: impl AsRef<Path>) -> TransportResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TransportError::TrustStore(format!("{}: {}", path.display(), e)))?;
        let mut reader = BufReader::new(file);

        let mut roots = RootCertStore::empty();
        let mut loaded = 0usize;
        for cert in rustls_pemfile::certs(&mut reader) {
            let cert = cert
                .map_err(|e| TransportError::TrustStore(format!("{}: {}", path.display(), e)))?;
            roots
                .add(cert)
                .map_err(|e| TransportError::TrustStore(format!("{}: {}", path.display(), e)))?;
            loaded += 1;
        }
        if loaded == 0 {
            return Err(TransportError::TrustStore(format!(
                "{}: no certificates found",
                path.display()
            )));
        }
        debug!(path = %path.display(), certificates = loaded, "trust store loaded");
        Ok(Self::with_roots(roots))
    }

    /// Builds a context trusting the bundled webpki root set, for peers
    /// with certificates from public CAs.
    pub fn from_webpki_roots() -> Self {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(roots)
    }

    fn with_roots(roots: RootCertStore) -> Self {
        let config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();
        TlsContext {
            config: Arc::new(config),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Replaces the handshake deadline.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Current handshake deadline.
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    pub(crate) fn client_config(&self) -> Arc<rustls::ClientConfig> {
        Arc::clone(&self.config)
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("handshake_timeout", &self.handshake_timeout)
            .finish_non_exhaustive()
    }
}

/// Secure-session channel.
///
/// The session object handles record framing and encryption; the
/// descriptor underneath runs in non-blocking mode just like the plain
/// backend, so the shared transport loops apply unchanged.
pub struct TlsChannel {
    stream: StreamOwned<ClientConnection, TcpStream>,
    peer_addr: SocketAddr,
}

impl TlsChannel {
    /// Connects to `host:port`, then drives the TLS handshake to
    /// completion under the context's deadline.
    ///
    /// Certificate chain verification happens inside the handshake; a
    /// chain that does not verify fully against the context's trust
    /// store fails with
    /// [`CertificateVerification`](TransportError::CertificateVerification).
    pub fn open(host: &str, port: u16, ctx: &TlsContext) -> TransportResult<Self> {
        let (tcp, peer_addr) = connect_stream(host, port)?;
        tcp.set_nodelay(true)
            .map_err(|e| TransportError::Socket(e.to_string()))?;
        tcp.set_nonblocking(true)
            .map_err(|e| TransportError::Socket(e.to_string()))?;

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|_| TransportError::TlsHandshake(format!("invalid server name: {host}")))?;
        let conn = ClientConnection::new(ctx.client_config(), server_name)
            .map_err(|e| TransportError::TlsHandshake(e.to_string()))?;

        let mut stream = StreamOwned::new(conn, tcp);
        complete_handshake(&mut stream, ctx.handshake_timeout())?;
        debug!(peer = %peer_addr, "TLS handshake complete");
        Ok(TlsChannel { stream, peer_addr })
    }
}

/// Polls the handshake on the non-blocking descriptor until it finishes
/// or the deadline passes. No backoff between attempts - the handshake
/// is the only bounded wait in the crate.
fn complete_handshake(
    stream: &mut StreamOwned<ClientConnection, TcpStream>,
    timeout: Duration,
) -> TransportResult<()> {
    let deadline = Instant::now() + timeout;
    while stream.conn.is_handshaking() {
        match stream.conn.complete_io(&mut stream.sock) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::Interrupted => {
                if Instant::now() >= deadline {
                    return Err(TransportError::TlsHandshake(format!(
                        "timed out after {timeout:?}"
                    )));
                }
            }
            Err(e) => return Err(classify_handshake_error(&e)),
        }
    }
    Ok(())
}

/// Splits handshake failures into "the peer is not who the trust store
/// says" and everything else. Verification failures are always fatal to
/// the attempt - partial trust is never accepted.
fn classify_handshake_error(e: &std::io::Error) -> TransportError {
    if let Some(tls_err) = e.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()) {
        if matches!(tls_err, rustls::Error::InvalidCertificate(_)) {
            return TransportError::CertificateVerification(tls_err.to_string());
        }
        return TransportError::TlsHandshake(tls_err.to_string());
    }
    TransportError::TlsHandshake(e.to_string())
}

impl Channel for TlsChannel {
    fn send_all(&mut self, buf: &[u8]) -> TransportResult<usize> {
        let sent = send_all(&mut self.stream, buf)?;
        trace!(peer = %self.peer_addr, bytes = sent, "send complete");
        Ok(sent)
    }

    fn recv_available(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        // The session serves plaintext it has already decrypted before
        // touching the descriptor, so one readable event that carried
        // several records is still fully drained here.
        let received = recv_available(&mut self.stream, buf)?;
        trace!(peer = %self.peer_addr, bytes = received, "drained");
        Ok(received)
    }

    fn peer_endpoint(&self) -> String {
        self.peer_addr.to_string()
    }

    fn close(mut self: Box<Self>) {
        debug!(peer = %self.peer_addr, "closing TLS channel");
        self.stream.conn.send_close_notify();
        // Best effort: the peer may already be gone.
        let _ = self.stream.conn.complete_io(&mut self.stream.sock);
        let _ = self.stream.sock.shutdown(Shutdown::Both);
    }
}
