use pushclone_frame::{Frame, MAX_PAYLOAD};
use serde::Serialize;

use crate::cmd::{Context, EncodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{display_name, new_table, print_json, print_raw, to_hex, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    kind: &'static str,
    command: u8,
    command_name: &'static str,
    sequence: u8,
    payload_size: usize,
    checksum: u8,
    frame: &'a str,
}

pub fn run(args: EncodeArgs, ctx: &Context) -> CliResult<i32> {
    let payload = args.payload.resolve()?;
    let frame = Frame::new(args.command, args.sequence, payload);
    let bytes = frame
        .to_bytes()
        .map_err(|err| frame_error("encode failed", err))?;
    let hex = to_hex(&bytes);

    match ctx.format {
        OutputFormat::Json => print_json(&EncodeOutput {
            kind: "encoded",
            command: frame.command,
            command_name: display_name(frame.command),
            sequence: frame.sequence,
            payload_size: frame.payload.len(),
            checksum: frame.checksum(),
            frame: &hex,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["COMMAND", "SEQ", "SIZE", "CHECKSUM", "FRAME"]);
            table.add_row(vec![
                format!("{:#04X} {}", frame.command, display_name(frame.command)),
                frame.sequence.to_string(),
                format!("{}/{MAX_PAYLOAD}", frame.payload.len()),
                format!("{:#04X}", frame.checksum()),
                hex,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{hex}"),
        OutputFormat::Raw => print_raw(&bytes),
    }

    Ok(SUCCESS)
}
