use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use pushclone_frame::command_name;
use pushclone_link::LinkConfig;
use pushclone_registry::CommandRegistry;

use crate::exit::{link_error, registry_error, CliResult};
use crate::output::{parse_hex, OutputFormat};

pub mod commands;
pub mod decode;
pub mod encode;
pub mod listen;
pub mod send;
pub mod simulate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a frame and print its bytes.
    Encode(EncodeArgs),
    /// Parse a frame and report its fields or why it would be dropped.
    Decode(DecodeArgs),
    /// List the command table.
    Commands(CommandsArgs),
    /// Read a MIDI port and print received frames.
    Listen(ListenArgs),
    /// Write a single frame to a MIDI port.
    Send(SendArgs),
    /// Drive a link against an in-memory session and a scripted controller.
    Simulate(SimulateArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Options shared by every subcommand.
pub struct Context {
    pub format: OutputFormat,
    pub config: LinkConfig,
}

impl Context {
    pub fn load(format: OutputFormat, config_path: Option<&Path>) -> CliResult<Self> {
        let config = match config_path {
            Some(path) => LinkConfig::from_file(path)
                .map_err(|err| link_error("failed to load configuration", err))?,
            None => LinkConfig::default(),
        };
        Ok(Self { format, config })
    }

    /// The canonical command table, or one loaded from `table`.
    pub fn registry(&self, table: Option<&Path>) -> CliResult<CommandRegistry> {
        match table {
            Some(path) => CommandRegistry::from_file(path, self.config.registry)
                .map_err(|err| registry_error("failed to load command table", err)),
            None => Ok(CommandRegistry::canonical(self.config.registry)),
        }
    }
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Commands(args) => commands::run(args, ctx),
        Command::Listen(args) => listen::run(args, ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::Simulate(args) => simulate::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

/// Payload sources accepted by `encode` and `send`.
#[derive(Args, Debug, Default)]
pub struct PayloadArgs {
    /// Payload as hex bytes, e.g. "50 43".
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Payload as 7-bit ASCII text.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Read the payload from a file.
    #[arg(long, conflicts_with_all = ["hex", "data"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn resolve(&self) -> CliResult<Vec<u8>> {
        if let Some(hex) = &self.hex {
            return parse_hex(hex);
        }
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return std::fs::read(path).map_err(|err| {
                crate::exit::io_error(&format!("failed reading {}", path.display()), err)
            });
        }
        Ok(Vec::new())
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command name (e.g. HANDSHAKE) or byte (e.g. 0x60).
    #[arg(value_parser = parse_command)]
    pub command: u8,
    /// Sequence number, masked to 7 bits.
    #[arg(long, short = 's', default_value = "0")]
    pub sequence: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// One complete SysEx message as hex, F0 through F7.
    pub hex: String,
    /// Validate against a command table file instead of the built-in one.
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CommandsArgs {
    /// Load the table from a JSON file instead of the built-in one.
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// MIDI port to read (device node, FIFO or capture file).
    pub port: PathBuf,
    /// Only print these commands (comma-separated names or bytes).
    #[arg(long, value_delimiter = ',', value_parser = parse_command)]
    pub commands: Option<Vec<u8>>,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// MIDI port to write.
    pub port: PathBuf,
    /// Command name or byte.
    #[arg(long, short = 'c', value_parser = parse_command)]
    pub command: u8,
    /// Sequence number, masked to 7 bits.
    #[arg(long, short = 's', default_value = "0")]
    pub sequence: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Send even if the payload does not match the command's shape.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Session document (JSON) for the in-memory host.
    #[arg(long, value_name = "FILE")]
    pub session: Option<PathBuf>,
    /// Session size when no document is given, as TRACKSxSCENES.
    #[arg(long, default_value = "8x8", conflicts_with = "session")]
    pub size: String,
    /// Script file, one step per line.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
    /// A script step; may be repeated. Runs after --script.
    #[arg(long = "step", value_name = "STEP")]
    pub steps: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a command given by name (case-insensitive) or as a byte.
pub fn parse_command(input: &str) -> Result<u8, String> {
    let trimmed = input.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).map_err(|err| format!("invalid command byte: {err}"));
    }
    if let Ok(value) = trimmed.parse::<u8>() {
        return Ok(value);
    }
    let wanted = trimmed.to_ascii_uppercase();
    (0..=u8::MAX)
        .find(|id| command_name(*id) == Some(wanted.as_str()))
        .ok_or_else(|| format!("unknown command: {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_by_name_or_byte() {
        assert_eq!(parse_command("HANDSHAKE"), Ok(0x60));
        assert_eq!(parse_command("ring_navigate"), Ok(0x71));
        assert_eq!(parse_command("0x4D"), Ok(0x4D));
        assert_eq!(parse_command("96"), Ok(0x60));
        assert!(parse_command("NOT_A_COMMAND").is_err());
        assert!(parse_command("0x1FF").is_err());
    }

    #[test]
    fn payload_sources() {
        let hex = PayloadArgs {
            hex: Some("50 43".to_string()),
            ..PayloadArgs::default()
        };
        assert_eq!(hex.resolve().unwrap(), b"PC".to_vec());

        let data = PayloadArgs {
            data: Some("LV".to_string()),
            ..PayloadArgs::default()
        };
        assert_eq!(data.resolve().unwrap(), b"LV".to_vec());
        assert!(PayloadArgs::default().resolve().unwrap().is_empty());
    }
}
