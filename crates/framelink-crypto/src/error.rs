/// Errors raised by the payload encryption layer.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The pre-shared key could not be expanded into key material.
    #[error("failed to derive key material from the pre-shared key")]
    KeyDerivation,

    /// The AEAD primitive failed while encrypting.
    #[error("payload encryption failed")]
    EncryptionFailed,

    /// Tag mismatch, corrupted ciphertext, or primitive failure on decrypt.
    #[error("payload decryption failed (authentication tag did not verify)")]
    DecryptionFailed,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
