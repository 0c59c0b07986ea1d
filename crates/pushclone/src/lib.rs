//! Bidirectional SysEx link between a DAW session and the PushClone grid
//! controller.
//!
//! # Crate Structure
//!
//! - [`transport`]: raw MIDI port access
//! - [`frame`]: 7-bit-clean SysEx framing and value codecs
//! - [`registry`]: command table and payload-shape validation
//! - [`link`]: handshake, coalescing, session ring and grid sync

/// Re-export transport types.
pub mod transport {
    pub use pushclone_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pushclone_frame::*;
}

/// Re-export registry types.
pub mod registry {
    pub use pushclone_registry::*;
}

/// Re-export link types.
pub mod link {
    pub use pushclone_link::*;
}
