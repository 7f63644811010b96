use std::marker::PhantomData;
use std::time::Duration;

use prost::Message;
use tracing::debug;

use framelink_crypto::{ciphertext_capacity, CipherContext, CryptoError, TAG_SIZE};
use framelink_protocol as protocol;
use framelink_transport::{PacketDriver, PacketStream};

use crate::error::{ChannelError, Result};

/// Default staging-buffer multiplier.
///
/// The headroom absorbs garbage accumulated between valid frames while
/// the extractor resynchronizes, without forcing the driver to drop an
/// in-flight packet.
pub const DEFAULT_HEADROOM: usize = 10;

/// Channel tuning knobs.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Wall-clock bound on a whole `read` call.
    pub read_timeout: Duration,
    /// Bound between the start of a read and the first transport byte.
    pub first_byte_timeout: Duration,
    /// Staging-buffer multiplier. Clamped to at least 1.
    pub headroom: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(1),
            first_byte_timeout: Duration::from_secs(1),
            headroom: DEFAULT_HEADROOM,
        }
    }
}

fn buffer_size(message_size: usize, headroom: usize) -> usize {
    let length_width =
        protocol::encoded_size(message_size).unwrap_or(protocol::MAX_LENGTH_FIELD_SIZE);
    (protocol::PACKET_MIN_OVERHEAD + length_width + message_size) * headroom.max(1)
}

/// Per-channel encryption state, allocated on first rekey.
struct CryptoState {
    context: CipherContext,
    /// Serialization / decryption target.
    plaintext: Vec<u8>,
    /// `tag ‖ ciphertext` staging for the frame payload.
    ciphertext: Vec<u8>,
}

/// A framed message channel over a blocking byte stream.
///
/// `Local` is the message type written to the peer, `Remote` the type
/// expected from it. The channel owns its stream and staging buffers;
/// reads and writes use separate staging, but the channel itself is not
/// internally synchronized.
pub struct Channel<Local, Remote, S> {
    driver: PacketDriver<S>,
    config: ChannelConfig,
    max_message_size: usize,
    send_buf: Vec<u8>,
    crypto: Option<CryptoState>,
    _messages: PhantomData<fn(Local) -> Remote>,
}

impl<Local, Remote, S> Channel<Local, Remote, S>
where
    Local: Message,
    Remote: Message + Default,
    S: PacketStream,
{
    /// Create a channel accepting remote payloads up to
    /// `max_message_size` serialized bytes.
    ///
    /// The bound does not need to be precise; staging buffers are sized
    /// with [`DEFAULT_HEADROOM`] times slack on top of it.
    pub fn new(stream: S, max_message_size: usize) -> Self {
        Self::with_config(stream, max_message_size, ChannelConfig::default())
    }

    /// Transport-level staging size for messages up to `message_size`
    /// bytes, with [`DEFAULT_HEADROOM`] times slack.
    pub fn buffer_size_for(message_size: usize) -> usize {
        buffer_size(message_size, DEFAULT_HEADROOM)
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(stream: S, max_message_size: usize, config: ChannelConfig) -> Self {
        let staging = buffer_size(max_message_size, config.headroom);
        Self {
            driver: PacketDriver::new(stream, staging),
            config,
            max_message_size,
            send_buf: vec![0; staging],
            crypto: None,
            _messages: PhantomData,
        }
    }

    /// The configured remote payload bound.
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Whether payloads are wrapped in the AES-256-GCM envelope.
    pub fn encryption_enabled(&self) -> bool {
        self.crypto.is_some()
    }

    /// Current channel configuration.
    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Consume the channel and return the underlying stream.
    pub fn into_inner(self) -> S {
        self.driver.into_inner()
    }

    /// Enable payload encryption, deriving key and IV from `psk`.
    ///
    /// Replaces any prior cipher context and resizes the staging buffers
    /// for the encrypted payload bound (plaintext + tag + block slack).
    /// Both peers must derive from the same secret.
    pub fn set_encryption_key(&mut self, psk: &[u8]) -> Result<()> {
        let context = CipherContext::new(psk)?;

        let payload_cap = TAG_SIZE + ciphertext_capacity(self.max_message_size);
        let staging = buffer_size(payload_cap, self.config.headroom);
        self.driver.grow_buffer(staging);
        if self.send_buf.len() < staging {
            self.send_buf.resize(staging, 0);
        }

        self.crypto = Some(CryptoState {
            context,
            plaintext: Vec::with_capacity(buffer_size(
                self.max_message_size,
                self.config.headroom,
            )),
            ciphertext: Vec::with_capacity(payload_cap),
        });
        debug!(
            max_message_size = self.max_message_size,
            "cipher context installed; staging buffers resized"
        );
        Ok(())
    }

    /// Serialize, optionally encrypt, frame, and emit one message.
    pub fn write(&mut self, message: &Local) -> Result<()> {
        let payload_len = message.encoded_len();
        if payload_len > self.max_message_size {
            return Err(ChannelError::MessageTooLarge {
                size: payload_len,
                max: self.max_message_size,
            });
        }

        let frame_len = match &mut self.crypto {
            None => encode_message_frame(&mut self.send_buf, message, payload_len)?,
            Some(state) => {
                state.plaintext.clear();
                message
                    .encode(&mut state.plaintext)
                    .map_err(|_| ChannelError::Internal("message outgrew its reported length"))?;

                state.ciphertext.clear();
                state.ciphertext.resize(TAG_SIZE, 0);
                state.ciphertext.extend_from_slice(&state.plaintext);
                let tag = state
                    .context
                    .encrypt_detached(&mut state.ciphertext[TAG_SIZE..])?;
                state.ciphertext[..TAG_SIZE].copy_from_slice(&tag);

                protocol::encode_frame(&mut self.send_buf, &state.ciphertext)?
            }
        };

        self.driver.write_packet(&self.send_buf[..frame_len])?;
        Ok(())
    }

    /// Read one message using the configured timeouts.
    pub fn read(&mut self) -> Result<Remote> {
        self.read_with_timeouts(self.config.read_timeout, self.config.first_byte_timeout)
    }

    /// Read one message, bounding both timeouts by `timeout`.
    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<Remote> {
        self.read_with_timeouts(timeout, timeout)
    }

    /// Read one message with explicit whole-packet and first-byte bounds.
    ///
    /// Exactly one deserialization attempt is made per extracted frame:
    /// the CRC already guarantees byte integrity, so a frame that does
    /// not decode raises [`ChannelError::InvalidMessage`] immediately.
    /// The channel stays usable afterwards.
    pub fn read_with_timeouts(
        &mut self,
        timeout: Duration,
        first_byte_timeout: Duration,
    ) -> Result<Remote> {
        let payload_cap = self.frame_payload_cap();
        let extractor = move |buf: &[u8]| protocol::extract_packet(buf, payload_cap);
        let frame = self
            .driver
            .read_packet(&extractor, timeout, first_byte_timeout)?;
        let payload = protocol::get_payload(&frame)?;

        match &mut self.crypto {
            None => Remote::decode(payload).map_err(ChannelError::InvalidMessage),
            Some(state) => {
                if payload.len() < TAG_SIZE {
                    return Err(ChannelError::Crypto(CryptoError::DecryptionFailed));
                }
                let (tag, ciphertext) = payload.split_at(TAG_SIZE);
                state.plaintext.clear();
                state.plaintext.extend_from_slice(ciphertext);
                state.context.decrypt_detached(&mut state.plaintext, tag)?;
                Remote::decode(&state.plaintext[..]).map_err(ChannelError::InvalidMessage)
            }
        }
    }

    /// Payload bound handed to the extractor: encrypted payloads carry
    /// the tag and block slack on top of the message bound.
    fn frame_payload_cap(&self) -> usize {
        if self.crypto.is_some() {
            TAG_SIZE + ciphertext_capacity(self.max_message_size)
        } else {
            self.max_message_size
        }
    }
}

/// Frame a message directly over its serialization, skipping the
/// intermediate payload copy of the slice-based encoder.
fn encode_message_frame<M: Message>(buf: &mut [u8], message: &M, payload_len: usize) -> Result<usize> {
    let total = protocol::validate_encoding_buffer_size(buf.len(), payload_len)?;

    buf[0] = protocol::SYNC_0;
    buf[1] = protocol::SYNC_1;
    let length_width = protocol::encode_length(&mut buf[2..], payload_len)?;

    let payload_start = 2 + length_width;
    let payload_end = payload_start + payload_len;
    let mut body = &mut buf[payload_start..payload_end];
    message
        .encode(&mut body)
        .map_err(|_| ChannelError::Internal("message outgrew its reported length"))?;

    let checksum = protocol::crc(&buf[2..payload_end]);
    buf[payload_end..payload_end + 2].copy_from_slice(&checksum.to_le_bytes());
    Ok(total)
}
