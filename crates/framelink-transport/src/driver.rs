use std::io::ErrorKind;
use std::time::{Duration, Instant};

use bytes::{Buf, Bytes, BytesMut};
use framelink_protocol::Extraction;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::stream::PacketStream;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Acceptance oracle consulted by the driver after every read.
///
/// The driver never interprets bytes itself; the oracle decides whether
/// the buffer starts with a complete packet, needs more bytes, or holds
/// garbage that should be discarded.
pub trait Extractor {
    fn extract(&self, buf: &[u8]) -> Extraction;
}

impl<F> Extractor for F
where
    F: Fn(&[u8]) -> Extraction,
{
    fn extract(&self, buf: &[u8]) -> Extraction {
        self(buf)
    }
}

/// Reads and writes whole packets over a blocking byte stream.
///
/// Bytes accumulate in an internal buffer across calls: a partial packet
/// observed at timeout stays buffered and completes on the next read.
pub struct PacketDriver<S> {
    stream: S,
    buf: BytesMut,
}

impl<S: PacketStream> PacketDriver<S> {
    /// Create a driver with `buffer_size` bytes of staging headroom.
    pub fn new(stream: S, buffer_size: usize) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(buffer_size),
        }
    }

    /// Grow the staging buffer, keeping any buffered bytes.
    pub fn grow_buffer(&mut self, buffer_size: usize) {
        if buffer_size > self.buf.capacity() {
            self.buf.reserve(buffer_size - self.buf.len());
        }
    }

    /// Borrow the underlying stream.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the driver and return the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Read exactly one validated packet.
    ///
    /// `first_byte_timeout` bounds the wait for the first byte when
    /// nothing is buffered; `timeout` bounds the whole call. Fails with
    /// [`TransportError::FirstByteTimeout`] when the line stayed silent
    /// and [`TransportError::PacketTimeout`] when a partial packet was
    /// still pending at the deadline.
    pub fn read_packet<E: Extractor>(
        &mut self,
        extractor: &E,
        timeout: Duration,
        first_byte_timeout: Duration,
    ) -> Result<Bytes> {
        let deadline = Instant::now() + timeout;
        let first_deadline = Instant::now() + first_byte_timeout;
        let mut have_bytes = !self.buf.is_empty();

        loop {
            loop {
                match extractor.extract(&self.buf) {
                    Extraction::Frame(n) => return Ok(self.buf.split_to(n).freeze()),
                    Extraction::Skip(n) => {
                        trace!(discarded = n, "no packet start in buffered bytes");
                        self.buf.advance(n);
                    }
                    Extraction::Incomplete => break,
                }
            }

            let now = Instant::now();
            let limit = if have_bytes {
                deadline
            } else {
                deadline.min(first_deadline)
            };
            if now >= limit {
                return Err(if have_bytes {
                    TransportError::PacketTimeout
                } else {
                    TransportError::FirstByteTimeout
                });
            }

            self.stream.set_read_timeout(Some(limit - now))?;
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    have_bytes = true;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // Timeout kinds fall through to the deadline check above.
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Write all of `packet` and flush.
    pub fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < packet.len() {
            match self.stream.write(&packet[offset..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.stream.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}
