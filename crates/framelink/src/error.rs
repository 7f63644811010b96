/// Errors surfaced by a channel, distinguishable by the caller.
///
/// Frame rejections never appear here: the extractor expresses them as
/// byte discards inside the transport driver, and the channel only ever
/// sees validated frames.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Timeout, EOF, or I/O failure from the byte transport.
    #[error("transport error: {0}")]
    Transport(#[from] framelink_transport::TransportError),

    /// Encoding-side framing failure (undersized buffer, length overflow).
    #[error("framing error: {0}")]
    Codec(#[from] framelink_protocol::CodecError),

    /// Key derivation, encryption, or decryption failure.
    #[error("cipher error: {0}")]
    Crypto(#[from] framelink_crypto::CryptoError),

    /// The outgoing message serializes beyond the configured maximum.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The frame was valid (and decrypted, if applicable) but the bytes
    /// are not a valid message. The channel stays usable.
    #[error("frame carried an undecodable message: {0}")]
    InvalidMessage(#[from] prost::DecodeError),

    /// A protocol-level invariant broke. Indicates a bug.
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

pub type Result<T> = std::result::Result<T, ChannelError>;
