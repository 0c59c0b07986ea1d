//! 7-bit and 14-bit value primitives.
//!
//! SysEx data bytes carry 7 bits each, so anything wider is split into an
//! MSB/LSB pair. Colours travel as three such pairs, one per channel.

use bytes::BufMut;

use crate::error::{FrameError, Result};

/// Largest value a 14-bit pair can carry.
pub const MAX_14BIT: u16 = 0x3FFF;

/// Byte substituted for characters outside 7-bit ASCII.
const ASCII_REPLACEMENT: u8 = b'?';

/// 24-bit colour with one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale every channel by `factor` (clamped to 0.0..=1.0).
    pub fn scaled(self, factor: f32) -> Self {
        let factor = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * factor) as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// Split a value into `(msb, lsb)` 7-bit halves.
///
/// Values above [`MAX_14BIT`] are clamped to `MAX_14BIT`. Use
/// [`try_encode14`] when an out-of-range value must be rejected instead.
pub fn encode14(value: u16) -> (u8, u8) {
    let value = value.min(MAX_14BIT);
    (((value >> 7) & 0x7F) as u8, (value & 0x7F) as u8)
}

/// Split a value into `(msb, lsb)`, rejecting anything above 16383.
pub fn try_encode14(value: u32) -> Result<(u8, u8)> {
    if value > u32::from(MAX_14BIT) {
        return Err(FrameError::ValueOutOfRange { value });
    }
    Ok(encode14(value as u16))
}

/// Join `(msb, lsb)` back into a value. High bits of either byte are ignored.
pub fn decode14(msb: u8, lsb: u8) -> u16 {
    (u16::from(msb & 0x7F) << 7) | u16::from(lsb & 0x7F)
}

/// Encode a colour as `R_msb R_lsb G_msb G_lsb B_msb B_lsb`.
pub fn encode_color24(color: Rgb) -> [u8; 6] {
    let (r_msb, r_lsb) = encode14(u16::from(color.r));
    let (g_msb, g_lsb) = encode14(u16::from(color.g));
    let (b_msb, b_lsb) = encode14(u16::from(color.b));
    [r_msb, r_lsb, g_msb, g_lsb, b_msb, b_lsb]
}

/// Append an encoded colour to `dst`.
pub fn put_color24(dst: &mut impl BufMut, color: Rgb) {
    dst.put_slice(&encode_color24(color));
}

/// Decode a colour from the first six bytes of `data`.
///
/// Channels wider than 8 bits saturate at 255.
pub fn decode_color24(data: &[u8]) -> Option<Rgb> {
    let bytes = data.get(..6)?;
    let channel = |msb: u8, lsb: u8| decode14(msb, lsb).min(255) as u8;
    Some(Rgb::new(
        channel(bytes[0], bytes[1]),
        channel(bytes[2], bytes[3]),
        channel(bytes[4], bytes[5]),
    ))
}

/// Encode text as `[len, bytes...]`, truncated to `max_len` characters.
///
/// Characters outside 7-bit ASCII become `?`. The length byte never
/// exceeds 127.
pub fn encode_ascii_field(text: &str, max_len: usize) -> Vec<u8> {
    let limit = max_len.min(0x7F);
    let mut out = Vec::with_capacity(limit + 1);
    out.push(0);
    for ch in text.chars().take(limit) {
        let byte = if ch.is_ascii() {
            ch as u8 & 0x7F
        } else {
            ASCII_REPLACEMENT
        };
        out.push(byte);
    }
    out[0] = (out.len() - 1) as u8;
    out
}

/// Decode a `[len, bytes...]` field. Returns the text and bytes consumed.
pub fn decode_ascii_field(data: &[u8]) -> Option<(String, usize)> {
    let (&len, rest) = data.split_first()?;
    let len = usize::from(len & 0x7F);
    let bytes = rest.get(..len)?;
    let text = bytes.iter().map(|&b| char::from(b & 0x7F)).collect();
    Some((text, len + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode14_matches_known_split() {
        assert_eq!(encode14(1000), (7, 104));
        assert_eq!(encode14(0), (0, 0));
        assert_eq!(encode14(127), (0, 127));
        assert_eq!(encode14(128), (1, 0));
        assert_eq!(encode14(MAX_14BIT), (0x7F, 0x7F));
    }

    #[test]
    fn decode14_inverts_encode14_over_full_domain() {
        for value in 0..=MAX_14BIT {
            let (msb, lsb) = encode14(value);
            assert!(msb <= 0x7F && lsb <= 0x7F);
            assert_eq!(decode14(msb, lsb), value);
        }
    }

    #[test]
    fn encode14_clamps_out_of_range() {
        assert_eq!(encode14(16384), (0x7F, 0x7F));
        assert_eq!(encode14(u16::MAX), (0x7F, 0x7F));
    }

    #[test]
    fn try_encode14_rejects_out_of_range() {
        assert_eq!(try_encode14(16383).unwrap(), (0x7F, 0x7F));
        assert!(matches!(
            try_encode14(16384),
            Err(FrameError::ValueOutOfRange { value: 16384 })
        ));
    }

    #[test]
    fn color24_uses_msb_lsb_per_channel() {
        assert_eq!(
            encode_color24(Rgb::new(255, 0, 128)),
            [0x01, 0x7F, 0x00, 0x00, 0x01, 0x00]
        );
        assert_eq!(
            encode_color24(Rgb::new(220, 180, 100)),
            [1, 92, 1, 52, 0, 100]
        );
    }

    #[test]
    fn color24_decodes_and_saturates() {
        assert_eq!(
            decode_color24(&[1, 92, 1, 52, 0, 100]),
            Some(Rgb::new(220, 180, 100))
        );
        assert_eq!(
            decode_color24(&[0x7F, 0x7F, 0, 0, 0, 0]),
            Some(Rgb::new(255, 0, 0))
        );
        assert_eq!(decode_color24(&[1, 2, 3]), None);
    }

    #[test]
    fn ascii_field_truncates_and_masks() {
        assert_eq!(encode_ascii_field("Drums", 3), vec![3, b'D', b'r', b'u']);
        assert_eq!(encode_ascii_field("", 8), vec![0]);
        assert_eq!(encode_ascii_field("Bé", 8), vec![2, b'B', b'?']);
    }

    #[test]
    fn ascii_field_length_never_exceeds_seven_bits() {
        let long = "x".repeat(300);
        let field = encode_ascii_field(&long, 1000);
        assert_eq!(field[0], 127);
        assert_eq!(field.len(), 128);
    }

    #[test]
    fn ascii_field_decodes_with_consumed_count() {
        let field = encode_ascii_field("Bass", 10);
        let mut data = field.clone();
        data.push(0x55);
        assert_eq!(decode_ascii_field(&data), Some(("Bass".to_string(), 5)));
        assert_eq!(decode_ascii_field(&[4, b'a']), None);
    }

    #[test]
    fn rgb_scaling_clamps_factor() {
        let color = Rgb::new(200, 100, 50);
        assert_eq!(color.scaled(0.5), Rgb::new(100, 50, 25));
        assert_eq!(color.scaled(2.0), color);
        assert_eq!(color.scaled(-1.0), Rgb::BLACK);
    }
}
