use serde::{Deserialize, Serialize};

/// Controls how strictly frames are checked against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// When true, frames travelling against their declared direction are rejected.
    pub check_direction: bool,
    /// When true, commands missing from the table return `RegistryError::UnknownCommand`.
    pub reject_unknown: bool,
    /// Maximum bytes allowed for a command table file.
    pub max_table_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            check_direction: false,
            reject_unknown: false,
            max_table_file_size: 256 * 1024,
        }
    }
}
