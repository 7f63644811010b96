//! Point-to-point framed message channel for protobuf messages.
//!
//! This is the composition layer of framelink. A [`Channel`] moves
//! `prost`-encoded messages over any blocking byte stream:
//!
//! - On write: serialize → optionally encrypt → frame → transport.
//! - On read: transport → frame-extract → optionally decrypt → deserialize.
//!
//! The transport may lose bytes, insert garbage, or split and merge
//! writes arbitrarily; the framing layer resynchronizes byte-by-byte and
//! only CRC-valid frames ever reach deserialization. Enabling encryption
//! with [`Channel::set_encryption_key`] wraps every payload in an
//! AES-256-GCM envelope keyed from a pre-shared secret.

pub mod channel;
pub mod error;

pub use channel::{Channel, ChannelConfig, DEFAULT_HEADROOM};
pub use error::{ChannelError, Result};

pub use framelink_crypto as crypto;
pub use framelink_protocol as protocol;
pub use framelink_transport as transport;
