/// Errors that can occur while moving packets over the transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No byte arrived before the first-byte timeout expired.
    #[error("timeout waiting for the first byte of a packet")]
    FirstByteTimeout,

    /// Bytes arrived but no complete packet formed before the deadline.
    #[error("timeout with a partial packet pending")]
    PacketTimeout,

    /// The stream reached EOF before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
