use pushclone_frame::{decode_frame, FrameError};
use pushclone_registry::{RegistryError, Route};
use serde::Serialize;

use crate::cmd::{Context, DecodeArgs};
use crate::exit::{CliResult, DATA_INVALID, SUCCESS};
use crate::output::{display_name, new_table, parse_hex, print_json, print_raw, to_hex, OutputFormat};

#[derive(Serialize)]
struct DecodeOutput {
    kind: &'static str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    /// `known`, `unknown` or `rejected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn run(args: DecodeArgs, ctx: &Context) -> CliResult<i32> {
    let message = parse_hex(&args.hex)?;
    let registry = ctx.registry(args.table.as_deref())?;

    let out = match decode_frame(&message) {
        Ok(frame) => {
            let (route, reason, error) = match registry.validate(&frame, true) {
                Ok(Route::Known(_)) => ("known", None, None),
                Ok(Route::Unknown) => ("unknown", None, None),
                Err(err) => ("rejected", Some(rejection_kind(&err)), Some(err.to_string())),
            };
            DecodeOutput {
                kind: "decoded",
                valid: error.is_none(),
                command: Some(frame.command),
                command_name: Some(display_name(frame.command)),
                sequence: Some(frame.sequence),
                payload: Some(to_hex(&frame.payload)),
                route: Some(route),
                reason,
                error,
            }
        }
        Err(err) => dropped(&err),
    };

    match ctx.format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = new_table(vec!["FIELD", "VALUE"]);
            table.add_row(vec!["valid".to_string(), out.valid.to_string()]);
            if let (Some(command), Some(name)) = (out.command, out.command_name) {
                table.add_row(vec!["command".to_string(), format!("{command:#04X} {name}")]);
            }
            if let Some(sequence) = out.sequence {
                table.add_row(vec!["sequence".to_string(), sequence.to_string()]);
            }
            if let Some(payload) = &out.payload {
                table.add_row(vec!["payload".to_string(), payload.clone()]);
            }
            if let Some(route) = out.route {
                table.add_row(vec!["route".to_string(), route.to_string()]);
            }
            if let Some(error) = &out.error {
                table.add_row(vec!["error".to_string(), error.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => match (&out.error, out.command) {
            (None, Some(command)) => println!(
                "{command:#04X} {} seq={} route={} payload={}",
                display_name(command),
                out.sequence.unwrap_or_default(),
                out.route.unwrap_or("unknown"),
                out.payload.as_deref().unwrap_or("")
            ),
            (Some(error), _) => println!("dropped: {error}"),
            (None, None) => println!("dropped"),
        },
        OutputFormat::Raw => {
            if out.valid {
                print_raw(&message);
            }
        }
    }

    Ok(if out.valid { SUCCESS } else { DATA_INVALID })
}

fn dropped(err: &FrameError) -> DecodeOutput {
    DecodeOutput {
        kind: "decoded",
        valid: false,
        command: None,
        command_name: None,
        sequence: None,
        payload: None,
        route: None,
        reason: Some(err.kind()),
        error: Some(err.to_string()),
    }
}

fn rejection_kind(err: &RegistryError) -> &'static str {
    match err {
        RegistryError::PayloadShape { .. } => "payload_shape",
        RegistryError::WrongDirection { .. } => "wrong_direction",
        RegistryError::UnknownCommand(_) => "unknown_command",
        _ => "registry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_frames_report_reason_kind() {
        let out = dropped(&FrameError::BadChecksum {
            expected: 0x21,
            actual: 0x22,
        });
        assert!(!out.valid);
        assert_eq!(out.reason, Some("bad_checksum"));
        assert!(out.command.is_none());
    }

    #[test]
    fn registry_rejections_have_stable_kinds() {
        let err = RegistryError::UnknownCommand(0x7E);
        assert_eq!(rejection_kind(&err), "unknown_command");
    }
}
