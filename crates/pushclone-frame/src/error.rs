/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The message does not start with `F0 7F 00 7F`.
    #[error("invalid SysEx header (expected F0 7F 00 7F)")]
    BadHeader,

    /// The message does not end with `F7`.
    #[error("invalid SysEx terminator (expected F7)")]
    BadFooter,

    /// The declared 14-bit length disagrees with the bytes present.
    #[error("payload length mismatch (declared {declared}, actual {actual})")]
    LengthMismatch { declared: usize, actual: usize },

    /// The checksum byte does not match the recomputed XOR fold.
    #[error("checksum mismatch (expected {expected:#04x}, got {actual:#04x})")]
    BadChecksum { expected: u8, actual: u8 },

    /// The message is shorter than the smallest possible frame.
    #[error("truncated frame ({len} bytes)")]
    Truncated { len: usize },

    /// A byte that must be 7-bit clean has its high bit set.
    #[error("byte {byte:#04x} at offset {offset} is not 7-bit clean")]
    NonSevenBit { offset: usize, byte: u8 },

    /// The payload exceeds what a 14-bit length can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A partial SysEx message grew past the reader's buffer limit.
    #[error("SysEx message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// A value does not fit the 14-bit wire range.
    #[error("value {value} out of 14-bit range")]
    ValueOutOfRange { value: u32 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// True for envelope failures that the link drops silently.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            FrameError::BadHeader
                | FrameError::BadFooter
                | FrameError::LengthMismatch { .. }
                | FrameError::BadChecksum { .. }
                | FrameError::Truncated { .. }
                | FrameError::NonSevenBit { .. }
                | FrameError::MessageTooLarge { .. }
        )
    }

    /// Short stable label, used for drop counters and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::BadHeader => "bad_header",
            FrameError::BadFooter => "bad_footer",
            FrameError::LengthMismatch { .. } => "length_mismatch",
            FrameError::BadChecksum { .. } => "bad_checksum",
            FrameError::Truncated { .. } => "truncated",
            FrameError::NonSevenBit { .. } => "non_seven_bit",
            FrameError::PayloadTooLarge { .. } => "payload_too_large",
            FrameError::MessageTooLarge { .. } => "message_too_large",
            FrameError::ValueOutOfRange { .. } => "value_out_of_range",
            FrameError::Io(_) => "io",
            FrameError::ConnectionClosed => "connection_closed",
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
