// SPDX-FileCopyrightText: 2026 Relaywire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport Error Types

use thiserror::Error;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur while opening or driving a channel.
///
/// Every variant is fatal to the connection it concerns: the protocol
/// engine above is expected to drop the channel and apply its own
/// reconnect policy. The retryable "nothing to do right now" condition
/// of a non-blocking descriptor is handled inside the transport loops
/// and never surfaces here.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("address resolution failed: {0}")]
    Resolution(String),

    #[error("no endpoint connectable: {0}")]
    Connect(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("peer certificate rejected: {0}")]
    CertificateVerification(String),

    #[error("trust store unusable: {0}")]
    TrustStore(String),

    #[error("connection closed by peer")]
    Closed,

    #[error("socket error: {0}")]
    Socket(String),
}
