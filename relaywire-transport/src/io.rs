// SPDX-FileCopyrightText: 2026 Relaywire Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Send-All / Drain-Available Loops
//!
//! The two byte-pump loops shared by every channel backend. Both operate
//! on plain [`Read`]/[`Write`] streams in non-blocking mode, so the same
//! code drives a raw descriptor and a secure session: the secure session
//! surfaces its own "nothing ready" condition as `WouldBlock` exactly
//! like the descriptor underneath it does.

use std::io::{ErrorKind, Read, Write};

use crate::error::{TransportError, TransportResult};

/// Writes all of `buf`, retrying would-block outcomes without backoff,
/// then flushes whatever the stream staged internally.
///
/// Returns `buf.len()` on success - never a short count. On failure no
/// partial count is reported, even if a prefix already reached the peer.
/// Backoff under sustained congestion is the caller's responsibility.
pub(crate) fn send_all<S: Write>(stream: &mut S, buf: &[u8]) -> TransportResult<usize> {
    let mut sent = 0;
    while sent < buf.len() {
        match stream.write(&buf[sent..]) {
            // The stream accepted nothing and will never accept more.
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => sent += n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Socket(e.to_string())),
        }
    }
    flush_pending(stream)?;
    Ok(sent)
}

/// Drives `flush` to completion so bytes staged inside the stream (TLS
/// records awaiting transmission) actually reach the descriptor before
/// `send_all` reports success. A no-op for raw sockets.
fn flush_pending<S: Write>(stream: &mut S) -> TransportResult<()> {
    loop {
        match stream.flush() {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::WouldBlock => continue,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Socket(e.to_string())),
        }
    }
}

/// Reads whatever is immediately available into `buf`, accumulating
/// until the stream reports would-block, the buffer is full, or the
/// stream ends. Never waits for more data to arrive.
///
/// Returns the number of bytes written into `buf`, which is legitimately
/// zero on an idle connection. End-of-stream with nothing accumulated is
/// reported as [`TransportError::Closed`]; end-of-stream after some bytes
/// were drained returns those bytes, and the next call reports `Closed`.
pub(crate) fn recv_available<S: Read>(stream: &mut S, buf: &mut [u8]) -> TransportResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled == 0 {
                    return Err(TransportError::Closed);
                }
                break;
            }
            Ok(n) => filled += n,
            // Drained to quiescence: nothing more is ready right now.
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            // Secure sessions report an abrupt peer hangup this way.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                if filled == 0 {
                    return Err(TransportError::Closed);
                }
                break;
            }
            Err(e) => return Err(TransportError::Socket(e.to_string())),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};

    /// Accepts at most `limit` bytes per write attempt, recording
    /// everything, optionally reporting would-block between attempts.
    struct ThrottledWriter {
        written: Vec<u8>,
        limit: usize,
        would_block_every_other: bool,
        calls: usize,
    }

    impl ThrottledWriter {
        fn new(limit: usize) -> Self {
            ThrottledWriter {
                written: Vec::new(),
                limit,
                would_block_every_other: false,
                calls: 0,
            }
        }
    }

    impl Write for ThrottledWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.would_block_every_other && self.calls % 2 == 1 {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "not ready"));
            }
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Serves queued chunks, then reports would-block (or end-of-stream).
    struct ScriptedReader {
        chunks: VecDeque<Vec<u8>>,
        then_eof: bool,
        interruptions: usize,
    }

    impl ScriptedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            ScriptedReader {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                then_eof: false,
                interruptions: 0,
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.interruptions > 0 {
                self.interruptions -= 1;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            match self.chunks.pop_front() {
                Some(mut chunk) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(chunk.split_off(n));
                    }
                    Ok(n)
                }
                None if self.then_eof => Ok(0),
                None => Err(io::Error::new(io::ErrorKind::WouldBlock, "idle")),
            }
        }
    }

    #[test]
    fn test_send_all_completes_across_partial_writes() {
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut writer = ThrottledWriter::new(512);

        let sent = send_all(&mut writer, &payload).unwrap();

        assert_eq!(sent, 10_000);
        assert_eq!(writer.written, payload);
        // 10 000 bytes at 512 per attempt needs at least 20 iterations.
        assert!(writer.calls >= 20);
    }

    #[test]
    fn test_send_all_retries_through_would_block() {
        let payload = vec![7u8; 4096];
        let mut writer = ThrottledWriter::new(128);
        writer.would_block_every_other = true;

        let sent = send_all(&mut writer, &payload).unwrap();

        assert_eq!(sent, 4096);
        assert_eq!(writer.written, payload);
    }

    #[test]
    fn test_send_all_empty_buffer() {
        let mut writer = ThrottledWriter::new(512);
        assert_eq!(send_all(&mut writer, &[]).unwrap(), 0);
        assert!(writer.written.is_empty());
    }

    #[test]
    fn test_send_all_zero_write_is_closed() {
        struct DeadWriter;
        impl Write for DeadWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let result = send_all(&mut DeadWriter, b"payload");
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn test_send_all_hard_error_is_socket_error() {
        struct BrokenWriter;
        impl Write for BrokenWriter {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer reset"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let result = send_all(&mut BrokenWriter, b"payload");
        assert!(matches!(result, Err(TransportError::Socket(_))));
    }

    #[test]
    fn test_send_all_flush_failure_is_socket_error() {
        struct UnflushableWriter;
        impl Write for UnflushableWriter {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer reset"))
            }
        }

        let result = send_all(&mut UnflushableWriter, b"payload");
        assert!(matches!(result, Err(TransportError::Socket(_))));
    }

    #[test]
    fn test_recv_available_drains_multiple_chunks() {
        let mut reader = ScriptedReader::new(&[b"hello ", b"relay ", b"world"]);
        let mut buf = [0u8; 64];

        let n = recv_available(&mut reader, &mut buf).unwrap();

        assert_eq!(n, 17);
        assert_eq!(&buf[..n], b"hello relay world");
    }

    #[test]
    fn test_recv_available_idle_returns_zero() {
        let mut reader = ScriptedReader::new(&[]);
        let mut buf = [0u8; 4096];

        let n = recv_available(&mut reader, &mut buf).unwrap();

        assert_eq!(n, 0);
    }

    #[test]
    fn test_recv_available_respects_capacity() {
        let mut reader = ScriptedReader::new(&[b"0123456789abcdef", b"overflow"]);
        let mut buf = [0u8; 10];

        let n = recv_available(&mut reader, &mut buf).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&buf[..], b"0123456789");

        // The remainder is still there for the next call.
        let mut rest = [0u8; 32];
        let n = recv_available(&mut reader, &mut rest).unwrap();
        assert_eq!(&rest[..n], b"abcdefoverflow");
    }

    #[test]
    fn test_recv_available_eof_with_nothing_is_closed() {
        let mut reader = ScriptedReader::new(&[]);
        reader.then_eof = true;
        let mut buf = [0u8; 16];

        let result = recv_available(&mut reader, &mut buf);
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn test_recv_available_eof_after_data_returns_data_first() {
        let mut reader = ScriptedReader::new(&[b"last words"]);
        reader.then_eof = true;
        let mut buf = [0u8; 64];

        let n = recv_available(&mut reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"last words");

        let result = recv_available(&mut reader, &mut buf);
        assert!(matches!(result, Err(TransportError::Closed)));
    }

    #[test]
    fn test_recv_available_retries_through_interruption() {
        let mut reader = ScriptedReader::new(&[b"after signal"]);
        reader.interruptions = 2;
        let mut buf = [0u8; 64];

        let n = recv_available(&mut reader, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"after signal");
    }

    #[test]
    fn test_recv_available_hard_error_is_socket_error() {
        struct BrokenReader;
        impl Read for BrokenReader {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let mut buf = [0u8; 16];
        let result = recv_available(&mut BrokenReader, &mut buf);
        assert!(matches!(result, Err(TransportError::Socket(_))));
    }
}
