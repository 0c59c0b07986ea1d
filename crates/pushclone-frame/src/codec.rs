use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::value::{decode14, encode14, MAX_14BIT};

/// Fixed SysEx header: start byte, non-commercial manufacturer ID, device ID, sub-ID.
pub const HEADER: [u8; 4] = [0xF0, 0x7F, 0x00, 0x7F];

/// SysEx terminator.
pub const FOOTER: u8 = 0xF7;

/// Bytes before the payload: header (4) + command + sequence + length (2).
pub const HEADER_SIZE: usize = 8;

/// Smallest valid frame: header, empty payload, checksum and terminator.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 2;

/// Largest payload a 14-bit length can describe.
pub const MAX_PAYLOAD: usize = MAX_14BIT as usize;

const SYSEX_START: u8 = 0xF0;

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Command identifier. Not restricted to 7 bits.
    pub command: u8,
    /// Sender sequence number, 0-127.
    pub sequence: u8,
    /// The message payload, every byte 0x00-0x7F.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame. The sequence is masked to 7 bits.
    pub fn new(command: u8, sequence: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            command,
            sequence: sequence & 0x7F,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame.
    pub fn wire_size(&self) -> usize {
        MIN_FRAME_SIZE + self.payload.len()
    }

    /// The checksum this frame carries on the wire.
    pub fn checksum(&self) -> u8 {
        checksum(self.command, self.sequence, &self.payload)
    }

    /// Encode this frame into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        encode_frame(self.command, self.sequence, &self.payload, &mut buf)?;
        Ok(buf.freeze())
    }
}

/// XOR fold of command, sequence and payload, masked to 7 bits.
pub fn checksum(command: u8, sequence: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(command ^ sequence, |acc, &byte| acc ^ byte)
        & 0x7F
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────┬─────┬─────┬──────────────┬─────────────┬──────────┬──────┐
/// │ Header (4B) │ Cmd │ Seq │ Length (2B)  │ Payload     │ Checksum │ End  │
/// │ F0 7F 00 7F │ 1B  │ 1B  │ 14-bit M/L   │ (Length B)  │ 1B       │ F7   │
/// └─────────────┴─────┴─────┴──────────────┴─────────────┴──────────┴──────┘
/// ```
///
/// The sequence is masked to 7 bits. Payload bytes must already be 7-bit
/// clean; use the helpers in [`crate::value`] to build them.
pub fn encode_frame(command: u8, sequence: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    if let Some(offset) = payload.iter().position(|&b| b > 0x7F) {
        return Err(FrameError::NonSevenBit {
            offset: HEADER_SIZE + offset,
            byte: payload[offset],
        });
    }

    let sequence = sequence & 0x7F;
    let (len_msb, len_lsb) = encode14(payload.len() as u16);

    dst.reserve(MIN_FRAME_SIZE + payload.len());
    dst.put_slice(&HEADER);
    dst.put_u8(command);
    dst.put_u8(sequence);
    dst.put_u8(len_msb);
    dst.put_u8(len_lsb);
    dst.put_slice(payload);
    dst.put_u8(checksum(command, sequence, payload));
    dst.put_u8(FOOTER);
    Ok(())
}

/// Decode one complete SysEx message into a frame.
///
/// `data` must be exactly one message, `F0` through `F7`. Validation runs
/// envelope first (size, header, footer, 7-bit cleanliness), then length,
/// then checksum.
pub fn decode_frame(data: &[u8]) -> Result<Frame> {
    if data.len() < MIN_FRAME_SIZE {
        return Err(FrameError::Truncated { len: data.len() });
    }
    if data[..HEADER.len()] != HEADER {
        return Err(FrameError::BadHeader);
    }
    if data[data.len() - 1] != FOOTER {
        return Err(FrameError::BadFooter);
    }

    // Everything after the command byte and before F7 must be 7-bit.
    let body_end = data.len() - 1;
    if let Some(pos) = data[5..body_end].iter().position(|&b| b > 0x7F) {
        return Err(FrameError::NonSevenBit {
            offset: 5 + pos,
            byte: data[5 + pos],
        });
    }

    let command = data[4];
    let sequence = data[5];
    let declared = usize::from(decode14(data[6], data[7]));
    let actual = data.len() - MIN_FRAME_SIZE;
    if declared != actual {
        return Err(FrameError::LengthMismatch { declared, actual });
    }

    let payload = &data[HEADER_SIZE..HEADER_SIZE + actual];
    let expected = checksum(command, sequence, payload);
    let received = data[body_end - 1];
    if expected != received {
        return Err(FrameError::BadChecksum {
            expected,
            actual: received,
        });
    }

    Ok(Frame {
        command,
        sequence,
        payload: Bytes::copy_from_slice(payload),
    })
}

/// Extract the next complete SysEx message from a shared MIDI byte stream.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet;
/// the partial message stays buffered. On success, consumes the message
/// bytes (and anything discarded before it) from the buffer.
///
/// - Bytes before `F0` are ordinary MIDI traffic and are discarded.
/// - Real-time bytes (`F8`-`FF`) inside a message are stripped.
/// - Any other status byte, or a new `F0`, aborts the partial message.
/// - A partial message longer than `max_len` is discarded with
///   [`FrameError::MessageTooLarge`].
pub fn split_sysex(src: &mut BytesMut, max_len: usize) -> Result<Option<Bytes>> {
    loop {
        match src.iter().position(|&b| b == SYSEX_START) {
            Some(start) => src.advance(start),
            None => {
                src.clear();
                return Ok(None);
            }
        }

        let mut message = BytesMut::with_capacity(src.len().min(max_len));
        message.put_u8(SYSEX_START);
        let mut aborted_at = None;
        let mut complete_at = None;

        for (i, &byte) in src.iter().enumerate().skip(1) {
            match byte {
                FOOTER => {
                    message.put_u8(FOOTER);
                    complete_at = Some(i + 1);
                    break;
                }
                0xF8..=0xFF => continue,
                SYSEX_START => {
                    aborted_at = Some(i);
                    break;
                }
                0x80..=0xF6 => {
                    aborted_at = Some(i + 1);
                    break;
                }
                _ => message.put_u8(byte),
            }
        }

        if let Some(end) = complete_at {
            src.advance(end);
            if message.len() > max_len {
                return Err(FrameError::MessageTooLarge {
                    size: message.len(),
                    max: max_len,
                });
            }
            return Ok(Some(message.freeze()));
        }

        if let Some(resume) = aborted_at {
            tracing::debug!(
                discarded = message.len(),
                "partial SysEx message aborted by status byte"
            );
            src.advance(resume);
            continue;
        }

        if message.len() > max_len {
            let size = message.len();
            src.clear();
            return Err(FrameError::MessageTooLarge { size, max: max_len });
        }
        return Ok(None);
    }
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16383 (14-bit length).
    pub max_payload_size: usize,
}

impl FrameConfig {
    /// Largest complete SysEx message this configuration accepts.
    pub fn max_message_size(&self) -> usize {
        self.max_payload_size.min(MAX_PAYLOAD) + MIN_FRAME_SIZE
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}
