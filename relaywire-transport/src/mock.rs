// SPDX-FileCopyrightText: 2026 Relaywire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Channel
//!
//! Scripted in-memory implementation of [`Channel`] so the protocol
//! engine above this crate can be tested without opening sockets.

use std::collections::VecDeque;

use crate::channel::Channel;
use crate::error::{TransportError, TransportResult};

/// In-memory channel with queued inbound data and recorded outbound data.
///
/// `recv_available` serves queued chunks in order, splitting them across
/// calls when the caller's buffer is smaller than a chunk - the same
/// shape real descriptors produce. Errors can be injected on either
/// direction to exercise the caller's connection-fatal handling.
pub struct MockChannel {
    inbound: VecDeque<Vec<u8>>,
    outbound: Vec<u8>,
    send_error: Option<TransportError>,
    recv_error: Option<TransportError>,
}

impl MockChannel {
    /// Creates an idle mock channel.
    pub fn new() -> Self {
        MockChannel {
            inbound: VecDeque::new(),
            outbound: Vec::new(),
            send_error: None,
            recv_error: None,
        }
    }

    /// Queues bytes to be served by the next `recv_available` calls.
    pub fn queue_recv(&mut self, bytes: &[u8]) {
        self.inbound.push_back(bytes.to_vec());
    }

    /// Everything sent through this channel so far, in order.
    pub fn sent_bytes(&self) -> &[u8] {
        &self.outbound
    }

    /// Makes the next `send_all` fail with `err`.
    pub fn fail_next_send(&mut self, err: TransportError) {
        self.send_error = Some(err);
    }

    /// Makes the next `recv_available` fail with `err`.
    pub fn fail_next_recv(&mut self, err: TransportError) {
        self.recv_error = Some(err);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for MockChannel {
    fn send_all(&mut self, buf: &[u8]) -> TransportResult<usize> {
        if let Some(err) = self.send_error.take() {
            return Err(err);
        }
        self.outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn recv_available(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        if let Some(err) = self.recv_error.take() {
            return Err(err);
        }
        let mut filled = 0;
        while filled < buf.len() {
            match self.inbound.pop_front() {
                Some(mut chunk) => {
                    let n = chunk.len().min(buf.len() - filled);
                    buf[filled..filled + n].copy_from_slice(&chunk[..n]);
                    filled += n;
                    if n < chunk.len() {
                        self.inbound.push_front(chunk.split_off(n));
                    }
                }
                None => break,
            }
        }
        Ok(filled)
    }

    fn peer_endpoint(&self) -> String {
        "mock:0".to_string()
    }

    fn close(self: Box<Self>) {}
}
