//! Authenticated encryption for framelink payloads.
//!
//! A [`CipherContext`] holds an AES-256-GCM key and IV derived
//! deterministically from a pre-shared secret. Payloads travel as
//! `tag ‖ ciphertext`, with the 16-byte GCM tag detached from the
//! ciphertext so the frame layout stays under the caller's control.
//!
//! The IV is fixed for the lifetime of a context — there is no per-message
//! nonce. Rekeying means dropping the context and deriving a new one.

pub mod context;
pub mod error;

pub use context::{
    ciphertext_capacity, CipherContext, IV_SIZE, KEY_SIZE, MAX_BLOCK_LENGTH, TAG_SIZE,
};
pub use error::{CryptoError, Result};
