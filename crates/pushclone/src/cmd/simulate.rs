//! Scripted controller against an in-memory host session.
//!
//! Each step plays the controller side (or the host side, for `set`,
//! `follow` and `resize`), then the virtual clock advances one coalescer
//! frame so queued updates flush. Outbound frames and host requests are
//! printed as they appear.

use std::io::Cursor;
use std::path::Path;
use std::time::{Duration, Instant};

use pushclone_frame::command::{
    CLIP_STOP, CLIP_TRIGGER, DISCONNECT, HANDSHAKE, HANDSHAKE_REPLY, OVERVIEW_TOGGLE,
    OVERVIEW_ZOOM, RING_NAVIGATE, RING_SELECT, SCENE_FIRE,
};
use pushclone_frame::{Frame, FrameError, FrameReader, Rgb};
use pushclone_link::coalescer::{MAX_FLUSH_RATE_HZ, MIN_FLUSH_RATE_HZ};
use pushclone_link::{CellKey, CellState, ClipState, HostRequest, Link, LinkStats, MemorySource};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{Context, SimulateArgs};
use crate::exit::{
    frame_error, io_error, link_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE,
};
use crate::output::{new_table, parse_hex, print_frame, print_json, OutputFormat};

/// Upper bound on timer firings inside a single `wait`.
const MAX_TICKS_PER_WAIT: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    /// A frame from the controller.
    Inject { command: u8, payload: Vec<u8> },
    /// Raw bytes on the MIDI input.
    Raw(Vec<u8>),
    /// Host-side cell change.
    Set { key: CellKey, state: CellState },
    /// Host-side selection change.
    Follow { track: u16, scene: u16 },
    /// Host-side session size change.
    Resize { tracks: u16, scenes: u16 },
    /// Local teardown.
    Close,
    Wait(Duration),
}

#[derive(Serialize)]
struct StepOutput<'a> {
    kind: &'static str,
    step: &'a str,
}

#[derive(Serialize)]
struct RequestOutput<'a> {
    kind: &'static str,
    #[serde(flatten)]
    request: &'a HostRequest,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    kind: &'static str,
    #[serde(flatten)]
    stats: &'a LinkStats,
}

pub fn run(args: SimulateArgs, ctx: &Context) -> CliResult<i32> {
    let source = match &args.session {
        Some(path) => load_session(path)?,
        None => {
            let (tracks, scenes) = parse_size(&args.size)?;
            MemorySource::new(tracks, scenes)
        }
    };

    let mut lines = Vec::new();
    if let Some(path) = &args.script {
        let script = std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        lines.extend(script.lines().map(str::to_string));
    }
    lines.extend(args.steps.iter().cloned());

    let mut steps = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        match parse_step(line) {
            Ok(Some(step)) => steps.push((line.trim(), step)),
            Ok(None) => {}
            Err(err) => {
                return Err(CliError::new(USAGE, format!("step {}: {err}", index + 1)));
            }
        }
    }

    let link = Link::new(Vec::new(), source, &ctx.config)
        .map_err(|err| link_error("failed to build link", err))?;
    let rate = ctx
        .config
        .coalescer
        .max_rate_hz
        .clamp(MIN_FLUSH_RATE_HZ, MAX_FLUSH_RATE_HZ);
    let mut sim = Simulator {
        link,
        now: Instant::now(),
        frame_time: Duration::from_secs(1) / rate,
        sequence: 0,
        format: ctx.format,
    };

    sim.link.open(sim.now);
    sim.drain()?;
    for (text, step) in steps {
        sim.announce(text);
        sim.apply(step);
        sim.drain()?;
    }
    sim.summary();

    Ok(SUCCESS)
}

struct Simulator {
    link: Link<Vec<u8>, MemorySource>,
    now: Instant,
    frame_time: Duration,
    /// Controller-side sequence counter.
    sequence: u8,
    format: OutputFormat,
}

impl Simulator {
    fn apply(&mut self, step: Step) {
        match step {
            Step::Inject { command, payload } => {
                let frame = Frame::new(command, self.sequence, payload);
                self.sequence = (self.sequence + 1) & 0x7F;
                match frame.to_bytes() {
                    Ok(bytes) => self.link.on_message(&bytes, self.now),
                    Err(err) => debug!(error = %err, "cannot encode injected frame"),
                }
            }
            Step::Raw(bytes) => self.link.on_bytes(&bytes, self.now),
            Step::Set { key, state } => {
                if self.link.source_mut().set_cell(key, state) {
                    self.link.on_state_change(key);
                }
            }
            Step::Follow { track, scene } => self.link.follow_selection(track, scene),
            Step::Resize { tracks, scenes } => {
                self.link.source_mut().set_totals(tracks, scenes);
                self.link.set_session_size(tracks, scenes);
            }
            Step::Close => self.link.disconnect(self.now),
            Step::Wait(duration) => {
                self.advance(duration);
                return;
            }
        }
        self.advance(self.frame_time);
    }

    /// Move the virtual clock, firing every deadline on the way.
    fn advance(&mut self, by: Duration) {
        let target = self.now + by;
        for _ in 0..MAX_TICKS_PER_WAIT {
            match self.link.next_deadline() {
                Some(deadline) if deadline <= target => {
                    self.now = self.now.max(deadline);
                    self.link.tick(self.now);
                }
                _ => break,
            }
        }
        self.now = target;
        self.link.tick(self.now);
    }

    fn drain(&mut self) -> CliResult<()> {
        let written = std::mem::take(self.link.transport_mut());
        let mut reader = FrameReader::new(Cursor::new(written));
        loop {
            match reader.read_frame() {
                Ok(frame) => print_frame(&frame, "out", self.format),
                Err(FrameError::ConnectionClosed) => break,
                Err(err) => return Err(frame_error("link wrote an invalid frame", err)),
            }
        }

        for request in self.link.drain_requests() {
            match self.format {
                OutputFormat::Json => print_json(&RequestOutput {
                    kind: "request",
                    request: &request,
                }),
                OutputFormat::Raw => {}
                OutputFormat::Table | OutputFormat::Pretty => println!("request {request:?}"),
            }
        }
        Ok(())
    }

    fn announce(&self, text: &str) {
        match self.format {
            OutputFormat::Json => print_json(&StepOutput { kind: "step", step: text }),
            OutputFormat::Raw => {}
            OutputFormat::Table | OutputFormat::Pretty => println!("> {text}"),
        }
    }

    fn summary(&self) {
        let stats = self.link.stats();
        let ring = self.link.ring();
        match self.format {
            OutputFormat::Json => print_json(&SummaryOutput {
                kind: "summary",
                stats: &stats,
            }),
            OutputFormat::Raw => {}
            OutputFormat::Table => {
                let mut table = new_table(vec!["FIELD", "VALUE"]);
                table.add_row(vec!["state".to_string(), format!("{:?}", stats.state)]);
                table.add_row(vec![
                    "ring".to_string(),
                    format!(
                        "track {} scene {} of {}x{}",
                        ring.track_offset, ring.scene_offset, ring.total_tracks, ring.total_scenes
                    ),
                ]);
                table.add_row(vec!["sent".to_string(), stats.frames_sent.to_string()]);
                table.add_row(vec!["received".to_string(), stats.frames_received.to_string()]);
                table.add_row(vec!["rejected".to_string(), stats.frames_rejected.to_string()]);
                table.add_row(vec![
                    "dropped".to_string(),
                    stats.frames_dropped.values().sum::<u64>().to_string(),
                ]);
                table.add_row(vec!["requests".to_string(), stats.requests.to_string()]);
                table.add_row(vec![
                    "subscriptions".to_string(),
                    stats.subscriptions.to_string(),
                ]);
                println!("{table}");
            }
            OutputFormat::Pretty => println!(
                "state={:?} ring={},{} sent={} received={} rejected={} requests={}",
                stats.state,
                ring.track_offset,
                ring.scene_offset,
                stats.frames_sent,
                stats.frames_received,
                stats.frames_rejected,
                stats.requests
            ),
        }
    }
}

fn load_session(path: &Path) -> CliResult<MemorySource> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    serde_json::from_str(&content).map_err(|err| {
        CliError::new(
            DATA_INVALID,
            format!("invalid session document {}: {err}", path.display()),
        )
    })
}

fn parse_size(input: &str) -> CliResult<(u16, u16)> {
    let parsed = input
        .split_once(|c| c == 'x' || c == 'X')
        .and_then(|(t, s)| Some((t.trim().parse().ok()?, s.trim().parse().ok()?)));
    parsed.ok_or_else(|| {
        CliError::new(
            USAGE,
            format!("invalid session size {input:?}, expected TRACKSxSCENES"),
        )
    })
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
fn parse_step(line: &str) -> Result<Option<Step>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    let step = match (verb.as_str(), args.as_slice()) {
        ("handshake", []) => inject(HANDSHAKE, b"PC".to_vec()),
        ("reply", []) => inject(HANDSHAKE_REPLY, b"LV".to_vec()),
        ("disconnect", []) => inject(DISCONNECT, Vec::new()),
        ("close", []) => Step::Close,
        ("nav", [direction]) => inject(RING_NAVIGATE, vec![nav_byte(direction)?]),
        ("tap", [row, column]) => inject(CLIP_TRIGGER, vec![byte(row)?, byte(column)?]),
        ("stop", [row, column]) => inject(CLIP_STOP, vec![byte(row)?, byte(column)?]),
        ("select", [row, column]) => inject(RING_SELECT, vec![byte(row)?, byte(column)?]),
        ("scene", [scene]) => inject(SCENE_FIRE, vec![byte(scene)?]),
        ("overview", []) => inject(OVERVIEW_TOGGLE, Vec::new()),
        ("zoom", []) => inject(OVERVIEW_ZOOM, Vec::new()),
        ("set", [track, scene, state, rest @ ..]) if rest.len() <= 1 => {
            let state = clip_state(state)?;
            let color = match rest.first() {
                Some(hex) => parse_color(hex)?,
                None => Rgb::WHITE,
            };
            Step::Set {
                key: CellKey::new(index(track)?, index(scene)?),
                state: if state == ClipState::Empty {
                    CellState::EMPTY
                } else {
                    CellState::new(state, color)
                },
            }
        }
        ("follow", [track, scene]) => Step::Follow {
            track: index(track)?,
            scene: index(scene)?,
        },
        ("resize", [tracks, scenes]) => Step::Resize {
            tracks: index(tracks)?,
            scenes: index(scenes)?,
        },
        ("wait", [duration]) => Step::Wait(parse_duration(duration)?),
        ("raw", hex @ [_, ..]) => {
            Step::Raw(parse_hex(&hex.join(" ")).map_err(|err| err.message)?)
        }
        _ => return Err(format!("unrecognized step: {line}")),
    };
    Ok(Some(step))
}

fn inject(command: u8, payload: Vec<u8>) -> Step {
    Step::Inject { command, payload }
}

fn nav_byte(direction: &str) -> Result<u8, String> {
    match direction.to_ascii_lowercase().as_str() {
        "left" => Ok(0),
        "right" => Ok(1),
        "up" => Ok(2),
        "down" => Ok(3),
        other => Err(format!("unknown direction: {other}")),
    }
}

fn byte(input: &str) -> Result<u8, String> {
    input
        .parse::<u8>()
        .ok()
        .filter(|value| *value <= 0x7F)
        .ok_or_else(|| format!("expected a 7-bit value, got {input:?}"))
}

fn index(input: &str) -> Result<u16, String> {
    input
        .parse()
        .map_err(|_| format!("expected an index, got {input:?}"))
}

fn clip_state(input: &str) -> Result<ClipState, String> {
    match input.to_ascii_lowercase().as_str() {
        "empty" => Ok(ClipState::Empty),
        "stopped" => Ok(ClipState::Stopped),
        "playing" => Ok(ClipState::Playing),
        "queued" => Ok(ClipState::Queued),
        "recording" => Ok(ClipState::Recording),
        other => Err(format!("unknown clip state: {other}")),
    }
}

fn parse_color(input: &str) -> Result<Rgb, String> {
    let hex = input.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected RRGGBB colour, got {input:?}"));
    }
    let channel = |at: usize| u8::from_str_radix(&hex[at..at + 2], 16).map_err(|e| e.to_string());
    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    match unit {
        "s" => Ok(Duration::from_secs(value)),
        _ => Ok(Duration::from_millis(value)),
    }
}

#[cfg(test)]
mod tests {
    use pushclone_link::LinkConfig;

    use super::*;

    fn sim(tracks: u16, scenes: u16) -> Simulator {
        let link = Link::new(
            Vec::new(),
            MemorySource::new(tracks, scenes),
            &LinkConfig::default(),
        )
        .unwrap();
        Simulator {
            link,
            now: Instant::now(),
            frame_time: Duration::from_millis(17),
            sequence: 0,
            format: OutputFormat::Raw,
        }
    }

    fn sent_commands(sim: &mut Simulator) -> Vec<u8> {
        let bytes = std::mem::take(sim.link.transport_mut());
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let mut commands = Vec::new();
        while let Ok(frame) = reader.read_frame() {
            commands.push(frame.command);
        }
        commands
    }

    #[test]
    fn parses_controller_steps() {
        assert_eq!(
            parse_step("handshake").unwrap(),
            Some(inject(HANDSHAKE, b"PC".to_vec()))
        );
        assert_eq!(
            parse_step("  nav Right ").unwrap(),
            Some(inject(RING_NAVIGATE, vec![1]))
        );
        assert_eq!(
            parse_step("tap 2 7").unwrap(),
            Some(inject(CLIP_TRIGGER, vec![2, 7]))
        );
        assert_eq!(parse_step("scene 3").unwrap(), Some(inject(SCENE_FIRE, vec![3])));
        assert_eq!(
            parse_step("raw F0 7F").unwrap(),
            Some(Step::Raw(vec![0xF0, 0x7F]))
        );
    }

    #[test]
    fn parses_host_steps() {
        assert_eq!(
            parse_step("set 1 2 playing ff0000").unwrap(),
            Some(Step::Set {
                key: CellKey::new(1, 2),
                state: CellState::new(ClipState::Playing, Rgb::new(255, 0, 0)),
            })
        );
        assert_eq!(
            parse_step("set 1 2 empty").unwrap(),
            Some(Step::Set {
                key: CellKey::new(1, 2),
                state: CellState::EMPTY,
            })
        );
        assert_eq!(
            parse_step("resize 16 32").unwrap(),
            Some(Step::Resize {
                tracks: 16,
                scenes: 32
            })
        );
        assert_eq!(
            parse_step("wait 2s").unwrap(),
            Some(Step::Wait(Duration::from_secs(2)))
        );
        assert_eq!(
            parse_step("wait 150").unwrap(),
            Some(Step::Wait(Duration::from_millis(150)))
        );
    }

    #[test]
    fn skips_comments_and_rejects_garbage() {
        assert_eq!(parse_step("# warm up").unwrap(), None);
        assert_eq!(parse_step("   ").unwrap(), None);
        assert!(parse_step("nav sideways").is_err());
        assert!(parse_step("tap 1").is_err());
        assert!(parse_step("tap 1 200").is_err());
        assert!(parse_step("set 0 0 glowing").is_err());
        assert!(parse_step("dance").is_err());
    }

    #[test]
    fn session_size_parses() {
        assert_eq!(parse_size("8x16").unwrap(), (8, 16));
        assert_eq!(parse_size("4X4").unwrap(), (4, 4));
        assert!(parse_size("8").is_err());
    }

    #[test]
    fn handshake_step_replies_and_dumps_state() {
        let mut sim = sim(8, 8);
        sim.link.open(sim.now);
        assert_eq!(sent_commands(&mut sim), vec![HANDSHAKE]);

        sim.apply(parse_step("handshake").unwrap().unwrap());
        let commands = sent_commands(&mut sim);
        assert_eq!(commands.first(), Some(&HANDSHAKE_REPLY));
        assert!(sim.link.is_connected());
    }

    #[test]
    fn tap_produces_host_request() {
        let mut sim = sim(8, 8);
        sim.apply(parse_step("handshake").unwrap().unwrap());
        sim.apply(parse_step("tap 1 2").unwrap().unwrap());
        assert_eq!(
            sim.link.drain_requests(),
            vec![HostRequest::FireClip { track: 1, scene: 2 }]
        );
    }

    #[test]
    fn wait_fires_handshake_retries() {
        let mut sim = sim(8, 8);
        sim.link.open(sim.now);
        let _ = sent_commands(&mut sim);
        sim.apply(Step::Wait(Duration::from_millis(2500)));
        assert_eq!(sent_commands(&mut sim), vec![HANDSHAKE, HANDSHAKE]);
    }
}
