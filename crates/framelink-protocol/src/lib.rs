//! Sync-delimited packet framing for unreliable byte transports.
//!
//! This is the wire layer of framelink. Every packet is framed with:
//! - Two sync bytes (0xB5 0x62) marking a possible frame start
//! - A base-128 little-endian varint payload length
//! - The payload bytes
//! - A CRC-CCITT(0x1D0F) checksum, little-endian, over length + payload
//!
//! The codec is pure: [`extract_packet`] never mutates its input and keeps
//! no state. A streaming consumer owns the accumulation buffer and slides
//! it by whatever [`Extraction`] tells it to discard or consume.

pub mod crc;
pub mod error;
pub mod frame;
pub mod varint;

pub use crc::crc;
pub use error::{CodecError, Result};
pub use frame::{
    encode_frame, extract_packet, get_payload, payload_range, validate_encoding_buffer_size,
    Extraction, PACKET_MAX_OVERHEAD, PACKET_MAX_PAYLOAD_SIZE,
    PACKET_MAX_PAYLOAD_SIZE_FIELD_LENGTH, PACKET_MIN_OVERHEAD, PACKET_MIN_SIZE, SYNC_0, SYNC_1,
};
pub use varint::{
    encode_length, encoded_size, parse_length, parse_length_capped, ParsedLength,
    MAX_LENGTH_FIELD_SIZE,
};
