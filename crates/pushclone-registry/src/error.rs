use crate::descriptor::{Direction, PayloadShape};

/// Errors raised while loading a command table or checking a frame.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The payload length does not fit the command's declared shape.
    #[error("payload shape mismatch for command {command:#04x}: expected {expected}, got {actual} bytes")]
    PayloadShape {
        command: u8,
        expected: PayloadShape,
        actual: usize,
    },

    /// The command may not travel in the direction it arrived.
    #[error("command {command:#04x} is {direction} only")]
    WrongDirection { command: u8, direction: Direction },

    /// The command is not in the table and unknown commands are rejected.
    #[error("unknown command {0:#04x}")]
    UnknownCommand(u8),

    /// A table lists the same command twice.
    #[error("duplicate command {0:#04x} in table")]
    DuplicateCommand(u8),

    /// The command table file could not be loaded.
    #[error("failed to load command table: {0}")]
    LoadFailed(String),

    /// The command table is not valid JSON.
    #[error("command table is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl RegistryError {
    /// True for per-frame verdicts, false for table loading failures.
    pub fn is_frame_rejection(&self) -> bool {
        matches!(
            self,
            RegistryError::PayloadShape { .. }
                | RegistryError::WrongDirection { .. }
                | RegistryError::UnknownCommand(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
