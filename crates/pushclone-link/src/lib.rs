//! Connection management and session synchronization for the PushClone
//! controller link.
//!
//! The [`Link`] ties together the handshake state machine, the outbound
//! coalescer, the session ring and the pad grid renderers. It performs no
//! I/O scheduling of its own: the caller feeds inbound bytes, host state
//! changes and clock ticks, and the link writes best-effort frames to the
//! transport it was given.

pub mod coalescer;
pub mod config;
pub mod error;
pub mod grid;
pub mod handshake;
pub mod link;
pub mod overview;
pub mod ring;
pub mod source;

pub use coalescer::{Coalescer, CoalescerConfig, CoalescerStats, Outgoing, Priority, SlotKey};
pub use config::{LinkConfig, MAX_CONFIG_FILE_SIZE};
pub use error::{LinkError, Result};
pub use grid::{shade, GridGeometry, GridSync};
pub use handshake::{ConnectionState, Handshake, HandshakeAction, HandshakeConfig};
pub use link::{HostRequest, Link, LinkStats};
pub use overview::{highlight, Overview, OverviewWindow, ZOOM_LEVELS};
pub use ring::{NavDirection, RingWindow, SessionRing, WindowChange};
pub use source::{CellKey, CellState, ClipState, MemorySource, StateSource, SubscriptionHandle};
