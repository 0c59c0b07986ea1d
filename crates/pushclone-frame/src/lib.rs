//! 7-bit-clean SysEx framing for the PushClone controller link.
//!
//! Every message is a MIDI System Exclusive envelope:
//! - A 4-byte fixed header `F0 7F 00 7F`
//! - A command byte and a 7-bit sequence number
//! - A 14-bit payload length split over two 7-bit bytes
//! - The payload (every byte 0x00-0x7F)
//! - A 7-bit XOR checksum and the `F7` terminator
//!
//! The transport has no acknowledgement or retransmission. A frame that
//! fails validation is dropped and the next periodic update heals it.

pub mod codec;
pub mod command;
pub mod error;
pub mod reader;
pub mod value;
pub mod writer;

pub use codec::{
    checksum, decode_frame, encode_frame, split_sysex, Frame, FrameConfig, FOOTER, HEADER,
    HEADER_SIZE, MAX_PAYLOAD, MIN_FRAME_SIZE,
};
pub use command::{command_name, CLIP_GRID_PAYLOAD_LEN};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use value::{
    decode14, decode_ascii_field, decode_color24, encode14, encode_ascii_field, encode_color24,
    try_encode14, Rgb, MAX_14BIT,
};
pub use writer::FrameWriter;
