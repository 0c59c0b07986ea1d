//! Command registry for the PushClone SysEx protocol.
//!
//! Maps each command byte to its direction and payload shape. The link
//! uses it at the frame-ingestion boundary to drop malformed payloads
//! and route the rest. Unknown commands are routed, not rejected, so a
//! newer controller firmware never breaks an older host.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod registry;
mod table;

pub use config::RegistryConfig;
pub use descriptor::{CommandDescriptor, Direction, PayloadShape};
pub use error::{RegistryError, Result};
pub use registry::{CommandRegistry, Route};
