//! Relaywire Transport
//!
//! Transport I/O boundary for Relaywire protocol clients: opens a plain
//! or TLS-wrapped connection and provides guaranteed-completion send and
//! drain-available receive primitives on top of non-blocking descriptors.
//! The protocol engine above relies on these to exchange exactly the byte
//! counts its framing requires; this crate absorbs partial writes, partial
//! reads, and transient "try again" conditions.
//!
//! Reconnection policy, keep-alive scheduling, and message framing are
//! collaborators above this layer - any error returned here is
//! connection-fatal and hands control back to them.
//!
//! # Example
//!
//! ```no_run
//! use relaywire_transport::{open, TlsContext, TransportResult};
//!
//! fn main() -> TransportResult<()> {
//!     let tls = TlsContext::from_ca_bundle("/etc/relaywire/ca-bundle.pem")?;
//!     let mut channel = open("relay.example.net", 8883, Some(&tls))?;
//!
//!     channel.send_all(b"\x10\x00")?;
//!
//!     let mut buf = [0u8; 4096];
//!     let n = channel.recv_available(&mut buf)?;
//!     println!("{} bytes ready", n);
//!
//!     channel.close();
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Channels are `Send` but provide no internal synchronization: all
//! operations take `&mut self`, so a handle is driven from one thread at
//! a time unless the caller adds its own ordering. Nothing on the data
//! path blocks; the only bounded wait in the crate is the TLS handshake
//! deadline inside [`open`]. The send loop busy-retries congestion
//! without backoff - callers that need pacing or cancellation build it
//! above this layer.

mod channel;
mod error;
mod io;
mod mock;
mod tcp;
#[cfg(feature = "tls")]
mod tls;

pub use channel::{open, Channel};
pub use error::{TransportError, TransportResult};
pub use mock::MockChannel;
pub use tcp::TcpChannel;
#[cfg(feature = "tls")]
pub use tls::{TlsChannel, TlsContext, DEFAULT_HANDSHAKE_TIMEOUT};
