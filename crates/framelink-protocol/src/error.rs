/// Errors that can occur while encoding or inspecting frames.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The caller-supplied buffer cannot hold the encoded form.
    #[error("target buffer too small ({available} bytes available, {needed} needed)")]
    BufferTooSmall { needed: usize, available: usize },

    /// The length does not fit in the 8-byte varint encoding.
    #[error("length {length} cannot be encoded in 8 varint bytes")]
    LengthOverflow { length: usize },

    /// The length field has no terminating byte inside the frame.
    #[error("length field not terminated within {0} bytes")]
    UnterminatedLength(usize),

    /// The frame claims more payload bytes than the buffer holds.
    #[error("frame claims {needed} bytes but only {available} are present")]
    PayloadOutOfBounds { needed: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
