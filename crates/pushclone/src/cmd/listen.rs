use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pushclone_frame::{FrameConfig, FrameError, FrameReader};
use tracing::{debug, info};

use crate::cmd::{Context, ListenArgs};
use crate::exit::{frame_error, CliError, CliResult, SUCCESS};
use crate::output::print_frame;

pub fn run(args: ListenArgs, ctx: &Context) -> CliResult<i32> {
    let mut reader = FrameReader::open_port(&args.port, FrameConfig::default())
        .map_err(|err| frame_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::ConnectionClosed) => {
                debug!("port reached end of stream");
                break;
            }
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        if let Some(commands) = &args.commands {
            if !commands.contains(&frame.command) {
                continue;
            }
        }

        print_frame(&frame, "in", ctx.format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    info!(printed, dropped = reader.dropped(), "listen finished");
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
