use std::io::Read;
use std::path::Path;

use pushclone_registry::RegistryConfig;
use serde::{Deserialize, Serialize};

use crate::coalescer::CoalescerConfig;
use crate::error::{LinkError, Result};
use crate::grid::GridGeometry;
use crate::handshake::HandshakeConfig;

/// Upper bound on a link configuration file.
pub const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Everything tunable about a link. Missing sections take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub handshake: HandshakeConfig,
    pub coalescer: CoalescerConfig,
    pub grid: GridGeometry,
    pub registry: RegistryConfig,
}

impl LinkConfig {
    pub fn validate(&self) -> Result<()> {
        self.handshake.validate()?;
        self.grid.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LinkConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file of at most [`MAX_CONFIG_FILE_SIZE`] bytes.
    pub fn from_file(path: &Path) -> Result<Self> {
        let read_err = |source| LinkError::ReadConfig {
            path: path.display().to_string(),
            source,
        };
        let file = std::fs::File::open(path).map_err(read_err)?;
        let mut content = String::new();
        file.take(MAX_CONFIG_FILE_SIZE + 1)
            .read_to_string(&mut content)
            .map_err(read_err)?;
        if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
            return Err(LinkError::Config(format!(
                "configuration file exceeds {MAX_CONFIG_FILE_SIZE} bytes: {}",
                path.display()
            )));
        }
        Self::from_json_str(&content)
    }
}
