//! Blocking byte-transport driver for framelink.
//!
//! The driver owns a stream and an accumulation buffer. It reads whatever
//! the transport produces — garbage, partial frames, several frames glued
//! together — and consults an extraction oracle after every read to decide
//! whether a complete packet is available. Callers always get exactly one
//! validated frame per [`PacketDriver::read_packet`] call.

pub mod driver;
pub mod error;
pub mod stream;

pub use driver::{Extractor, PacketDriver};
pub use error::{Result, TransportError};
pub use stream::PacketStream;

pub use framelink_protocol::Extraction;
