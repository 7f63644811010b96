use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;
/// GCM IV size in bytes.
pub const IV_SIZE: usize = 12;
/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;
/// Upper bound on cipher block expansion, carried into buffer sizing.
pub const MAX_BLOCK_LENGTH: usize = 32;

/// Iteration count of the key derivation chain.
const NROUNDS: u32 = 1_000_000;

/// Worst-case ciphertext size for a plaintext of `plaintext_len` bytes.
///
/// GCM does not expand the payload, but buffer sizing keeps the block
/// slack so the bound holds for any cipher with the same tag layout.
pub fn ciphertext_capacity(plaintext_len: usize) -> usize {
    plaintext_len + MAX_BLOCK_LENGTH - 1
}

/// Channel-lifetime holder of the AES-256-GCM key and IV.
///
/// Key and IV are derived deterministically from the pre-shared key, so
/// both peers reach the same context without any negotiation. The IV is
/// reused for every message under this context; swapping keys requires
/// building a fresh context.
pub struct CipherContext {
    cipher: Aes256Gcm,
    iv: [u8; IV_SIZE],
}

impl CipherContext {
    /// Derive a cipher context from a pre-shared key.
    ///
    /// Expansion follows the OpenSSL `EVP_BytesToKey` construction with
    /// SHA-256, no salt, and 1,000,000 rounds: each digest block is
    /// `H^rounds(previous_block ‖ psk)`, concatenated until 44 bytes of
    /// key material (32 key + 12 IV) are available.
    pub fn new(psk: &[u8]) -> Result<Self> {
        let mut material = [0u8; KEY_SIZE + IV_SIZE];
        bytes_to_key(psk, &mut material);

        let cipher = Aes256Gcm::new_from_slice(&material[..KEY_SIZE])
            .map_err(|_| CryptoError::KeyDerivation)?;
        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&material[KEY_SIZE..]);
        material.zeroize();

        Ok(Self { cipher, iv })
    }

    /// Encrypt `buf` in place and return the detached 16-byte tag.
    ///
    /// The ciphertext occupies exactly the plaintext's bytes.
    pub fn encrypt_detached(&self, buf: &mut [u8]) -> Result<[u8; TAG_SIZE]> {
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(&self.iv), b"", buf)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Decrypt `buf` in place, verifying the detached tag.
    ///
    /// Fails closed: on any verification failure the buffer contents are
    /// not usable as plaintext.
    pub fn decrypt_detached(&self, buf: &mut [u8], tag: &[u8]) -> Result<()> {
        if tag.len() != TAG_SIZE {
            return Err(CryptoError::DecryptionFailed);
        }
        self.cipher
            .decrypt_in_place_detached(Nonce::from_slice(&self.iv), b"", buf, Tag::from_slice(tag))
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl Drop for CipherContext {
    fn drop(&mut self) {
        // The `zeroize` feature wipes the cipher's key schedule when it
        // drops; the IV copy is ours to scrub.
        self.iv.zeroize();
    }
}

impl std::fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key or IV material.
        f.debug_struct("CipherContext").finish_non_exhaustive()
    }
}

/// `EVP_BytesToKey`-style digest chain filling `out` from `psk`.
fn bytes_to_key(psk: &[u8], out: &mut [u8]) {
    let mut previous: Vec<u8> = Vec::new();
    let mut written = 0;
    while written < out.len() {
        let mut hasher = Sha256::new();
        hasher.update(&previous);
        hasher.update(psk);
        let mut digest = hasher.finalize();
        for _ in 1..NROUNDS {
            digest = Sha256::digest(digest);
        }

        let take = (out.len() - written).min(digest.len());
        out[written..written + take].copy_from_slice(&digest[..take]);
        previous.zeroize();
        previous = digest.to_vec();
        written += take;
    }
    previous.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    // Context construction runs the full 1M-round derivation, so tests
    // share as few contexts as they can get away with.

    #[test]
    fn roundtrip_and_determinism() {
        let sender = CipherContext::new(b"a shared secret").unwrap();
        let receiver = CipherContext::new(b"a shared secret").unwrap();

        let plaintext = b"the quick brown fox";
        let mut buf = plaintext.to_vec();
        let tag = sender.encrypt_detached(&mut buf).unwrap();

        assert_eq!(buf.len(), plaintext.len());
        assert_ne!(&buf[..], &plaintext[..]);

        // Same psk, same IV: the transform is deterministic.
        let mut again = plaintext.to_vec();
        let tag_again = receiver.encrypt_detached(&mut again).unwrap();
        assert_eq!(buf, again);
        assert_eq!(tag, tag_again);

        receiver.decrypt_detached(&mut buf, &tag).unwrap();
        assert_eq!(&buf[..], &plaintext[..]);
    }

    #[test]
    fn tampering_is_detected() {
        let ctx = CipherContext::new(b"tamper test secret").unwrap();

        let mut buf = b"payload bytes".to_vec();
        let tag = ctx.encrypt_detached(&mut buf).unwrap();

        let mut flipped = buf.clone();
        flipped[0] ^= 0x01;
        assert!(matches!(
            ctx.decrypt_detached(&mut flipped, &tag),
            Err(CryptoError::DecryptionFailed)
        ));

        let mut bad_tag = tag;
        bad_tag[15] ^= 0x80;
        let mut copy = buf.clone();
        assert!(matches!(
            ctx.decrypt_detached(&mut copy, &bad_tag),
            Err(CryptoError::DecryptionFailed)
        ));

        let mut short = buf.clone();
        assert!(matches!(
            ctx.decrypt_detached(&mut short, &tag[..8]),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn different_psks_do_not_interoperate() {
        let alice = CipherContext::new(b"secret-one").unwrap();
        let eve = CipherContext::new(b"secret-two").unwrap();

        let mut buf = b"for alice only".to_vec();
        let tag = alice.encrypt_detached(&mut buf).unwrap();

        assert!(matches!(
            eve.decrypt_detached(&mut buf, &tag),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let ctx = CipherContext::new(b"empty payload secret").unwrap();
        let mut buf = Vec::new();
        let tag = ctx.encrypt_detached(&mut buf).unwrap();
        assert!(buf.is_empty());
        ctx.decrypt_detached(&mut buf, &tag).unwrap();
    }

    #[test]
    fn capacity_keeps_block_slack() {
        assert_eq!(ciphertext_capacity(0), MAX_BLOCK_LENGTH - 1);
        assert_eq!(ciphertext_capacity(100), 100 + MAX_BLOCK_LENGTH - 1);
    }

    #[test]
    fn debug_output_hides_key_material() {
        let ctx = CipherContext::new(b"debug secret").unwrap();
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("iv"));
        assert!(!rendered.contains("key"));
    }
}
