//! Raw MIDI port transport.
//!
//! The PushClone link talks to the controller over a plain byte stream that
//! is shared with ordinary MIDI traffic. On Linux that is an ALSA raw MIDI
//! node (`/dev/snd/midiC1D0`), on other Unix systems a character device or a
//! FIFO bridged by a MIDI daemon. Everything above this crate only needs
//! [`std::io::Read`] and [`std::io::Write`], which [`MidiPort`] provides.
//!
//! This is the lowest layer of pushclone. It knows nothing about SysEx
//! framing.

pub mod error;
pub mod port;

pub use error::{Result, TransportError};
pub use port::{MidiPort, PortOptions};
