use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use pushclone_frame::{command_name, Frame};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::descriptor::CommandDescriptor;
use crate::error::{RegistryError, Result};
use crate::table::CANONICAL;

/// Routing verdict for a frame that passed the registry checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// The command is in the table and its payload fits.
    Known(&'a CommandDescriptor),
    /// The command is not in the table. Hand it to the no-op handler.
    Unknown,
}

/// Command-keyed table of descriptors.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    descriptors: HashMap<u8, CommandDescriptor>,
    config: RegistryConfig,
}

impl CommandRegistry {
    /// The canonical table with default config.
    pub fn new() -> Self {
        Self::canonical(RegistryConfig::default())
    }

    /// The canonical table with explicit config.
    pub fn canonical(config: RegistryConfig) -> Self {
        let mut registry = Self::empty(config);
        for &(id, direction, shape) in CANONICAL {
            let name = command_name(id).unwrap_or("UNNAMED");
            registry
                .descriptors
                .insert(id, CommandDescriptor::new(id, name, direction, shape));
        }
        registry
    }

    /// An empty table with explicit config.
    pub fn empty(config: RegistryConfig) -> Self {
        Self {
            descriptors: HashMap::new(),
            config,
        }
    }

    /// Add a descriptor. Fails if the command is already present.
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<()> {
        if self.descriptors.contains_key(&descriptor.id) {
            return Err(RegistryError::DuplicateCommand(descriptor.id));
        }
        self.descriptors.insert(descriptor.id, descriptor);
        Ok(())
    }

    /// Load a table from a JSON array of descriptors.
    ///
    /// A descriptor with an empty `name` takes the built-in name for its id.
    pub fn from_json(json: &str, config: RegistryConfig) -> Result<Self> {
        let entries: Vec<CommandDescriptor> = serde_json::from_str(json)?;
        let mut registry = Self::empty(config);
        for mut entry in entries {
            if entry.name.is_empty() {
                entry.name = command_name(entry.id).unwrap_or("UNNAMED").to_string();
            }
            registry.register(entry)?;
        }
        debug!(commands = registry.len(), "loaded command table");
        Ok(registry)
    }

    /// Load a table from a JSON file, bounded by `max_table_file_size`.
    pub fn from_file(path: &Path, config: RegistryConfig) -> Result<Self> {
        let metadata = std::fs::symlink_metadata(path)
            .map_err(|err| RegistryError::LoadFailed(format!("{}: {err}", path.display())))?;
        if metadata.file_type().is_symlink() {
            return Err(RegistryError::LoadFailed(format!(
                "refusing to load command table symlink: {}",
                path.display()
            )));
        }
        if metadata.len() > config.max_table_file_size as u64 {
            return Err(RegistryError::LoadFailed(format!(
                "command table too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let file = std::fs::File::open(path)
            .map_err(|err| RegistryError::LoadFailed(format!("{}: {err}", path.display())))?;
        let read_limit = u64::try_from(config.max_table_file_size.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| RegistryError::LoadFailed(format!("{}: {err}", path.display())))?;
        if content.len() > config.max_table_file_size {
            return Err(RegistryError::LoadFailed(format!(
                "command table too large while reading: {}",
                path.display()
            )));
        }

        Self::from_json(&content, config)
    }

    /// Look up a command.
    pub fn lookup(&self, command: u8) -> Option<&CommandDescriptor> {
        self.descriptors.get(&command)
    }

    /// Check a frame against the table. `inbound` means device to host.
    ///
    /// Unknown commands route to [`Route::Unknown`] unless
    /// `reject_unknown` is set. Direction is only checked when
    /// `check_direction` is set.
    pub fn validate(&self, frame: &Frame, inbound: bool) -> Result<Route<'_>> {
        let Some(descriptor) = self.descriptors.get(&frame.command) else {
            if self.config.reject_unknown {
                return Err(RegistryError::UnknownCommand(frame.command));
            }
            return Ok(Route::Unknown);
        };

        if self.config.check_direction && !descriptor.direction.allows(inbound) {
            return Err(RegistryError::WrongDirection {
                command: frame.command,
                direction: descriptor.direction,
            });
        }

        if !descriptor.shape.accepts(frame.payload.len()) {
            return Err(RegistryError::PayloadShape {
                command: frame.command,
                expected: descriptor.shape,
                actual: frame.payload.len(),
            });
        }

        Ok(Route::Known(descriptor))
    }

    /// All descriptors, sorted by command id.
    pub fn descriptors(&self) -> Vec<&CommandDescriptor> {
        let mut all: Vec<&CommandDescriptor> = self.descriptors.values().collect();
        all.sort_unstable_by_key(|d| d.id);
        all
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
