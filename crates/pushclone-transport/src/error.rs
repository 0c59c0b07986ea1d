use std::path::PathBuf;

/// Errors that can occur while opening or using a MIDI port.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The port node could not be opened.
    #[error("failed to open MIDI port {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the port.
    #[error("MIDI port I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
