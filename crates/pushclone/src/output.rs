use std::fmt::Write as _;
use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pushclone_frame::{command_name, Frame};
use serde::Serialize;

use crate::exit::{CliError, CliResult, USAGE};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct FrameOutput<'a> {
    pub kind: &'static str,
    pub origin: &'a str,
    pub command: u8,
    pub command_name: &'static str,
    pub sequence: u8,
    pub payload_size: usize,
    pub payload: String,
    pub timestamp: String,
}

impl<'a> FrameOutput<'a> {
    pub fn new(frame: &Frame, origin: &'a str) -> Self {
        Self {
            kind: "frame",
            origin,
            command: frame.command,
            command_name: display_name(frame.command),
            sequence: frame.sequence,
            payload_size: frame.payload.len(),
            payload: to_hex(&frame.payload),
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_frame(frame: &Frame, origin: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&FrameOutput::new(frame, origin)),
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "SEQ", "SIZE", "ORIGIN", "PAYLOAD"]);
            table.add_row(vec![
                format!("{:#04X} {}", frame.command, display_name(frame.command)),
                frame.sequence.to_string(),
                frame.payload.len().to_string(),
                origin.to_string(),
                to_hex(&frame.payload),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", frame_line(frame, origin)),
        OutputFormat::Raw => match frame.to_bytes() {
            Ok(bytes) => print_raw(&bytes),
            Err(err) => eprintln!("error: cannot re-encode frame: {err}"),
        },
    }
}

pub fn frame_line(frame: &Frame, origin: &str) -> String {
    format!(
        "{origin} {:#04X} {} seq={} size={} payload={}",
        frame.command,
        display_name(frame.command),
        frame.sequence,
        frame.payload.len(),
        to_hex(&frame.payload)
    )
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_name(command: u8) -> &'static str {
    command_name(command).unwrap_or("UNKNOWN")
}

/// Uppercase hex, space separated.
pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02X}");
    }
    out
}

/// Parse hex bytes. Whitespace, commas, colons and `0x` prefixes are
/// accepted between bytes.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let mut digits = String::with_capacity(input.len());
    for token in input.split(|c: char| c.is_whitespace() || c == ',' || c == ':') {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(CliError::new(USAGE, format!("invalid hex digit: {bad:?}")));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|err| CliError::new(USAGE, format!("invalid hex byte: {err}")))
        })
        .collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trips_common_spellings() {
        assert_eq!(parse_hex("F0 7F 00").unwrap(), vec![0xF0, 0x7F, 0x00]);
        assert_eq!(parse_hex("f07f00").unwrap(), vec![0xF0, 0x7F, 0x00]);
        assert_eq!(parse_hex("0xF0,0x7F").unwrap(), vec![0xF0, 0x7F]);
        assert_eq!(parse_hex("").unwrap(), Vec::<u8>::new());
        assert_eq!(to_hex(&[0xF0, 0x01]), "F0 01");
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(parse_hex("F0 7").is_err());
        assert!(parse_hex("GG").is_err());
    }

    #[test]
    fn frame_line_names_command() {
        let frame = Frame::new(0x60, 2, b"PC".to_vec());
        assert_eq!(
            frame_line(&frame, "out"),
            "out 0x60 HANDSHAKE seq=2 size=2 payload=50 43"
        );
    }
}
