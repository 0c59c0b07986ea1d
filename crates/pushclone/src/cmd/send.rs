use pushclone_frame::{Frame, FrameConfig, FrameWriter};
use pushclone_registry::{CommandRegistry, RegistryConfig, Route};
use tracing::{info, warn};

use crate::cmd::{Context, SendArgs};
use crate::exit::{frame_error, registry_error, CliResult, SUCCESS};
use crate::output::print_frame;

pub fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    let payload = args.payload.resolve()?;
    let frame = Frame::new(args.command, args.sequence, payload);

    if args.force {
        warn!(command = args.command, "skipping command table check");
    } else {
        check_shape(&frame, ctx.config.registry)?;
    }

    let mut writer = FrameWriter::open_port(&args.port, FrameConfig::default())
        .map_err(|err| frame_error("open failed", err))?;
    writer
        .write_frame(&frame)
        .map_err(|err| frame_error("send failed", err))?;
    info!(
        port = %args.port.display(),
        command = frame.command,
        sequence = frame.sequence,
        "frame sent"
    );

    print_frame(&frame, "sent", ctx.format);
    Ok(SUCCESS)
}

/// Host-to-device shape check. Unknown commands pass unless the table is
/// configured to reject them.
fn check_shape(frame: &Frame, config: RegistryConfig) -> CliResult<()> {
    let registry = CommandRegistry::canonical(config);
    match registry.validate(frame, false) {
        Ok(Route::Known(_)) => Ok(()),
        Ok(Route::Unknown) => {
            warn!(command = frame.command, "command not in table");
            Ok(())
        }
        Err(err) => Err(registry_error("refusing to send", err)),
    }
}
