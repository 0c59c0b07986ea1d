//! The link orchestrator.
//!
//! Owns the handshake, the coalescer, the session ring and both grid
//! renderers. Everything is driven by the caller: inbound bytes through
//! [`Link::on_bytes`] or [`Link::on_message`], host changes through
//! [`Link::on_state_change`], and time through [`Link::tick`]. Outbound
//! writes are best-effort. A failed write is logged, counted and dropped,
//! and the next periodic update heals the controller.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use pushclone_frame::command::{
    command_name, CLIP_STOP, CLIP_TRIGGER, DISCONNECT, HANDSHAKE, HANDSHAKE_REPLY,
    NEOTRELLIS_CLIP_GRID, OVERVIEW_TOGGLE, OVERVIEW_ZOOM, PING_TEST, RING_NAVIGATE,
    RING_POSITION, RING_SELECT, SCENE_FIRE, SCENE_SELECT, SESSION_OVERVIEW, TRACK_SELECT,
};
use pushclone_frame::{
    decode_frame, split_sysex, Frame, FrameConfig, FrameError, FrameWriter, MAX_PAYLOAD,
};
use pushclone_registry::{CommandRegistry, Route};
use pushclone_transport::{MidiPort, PortOptions};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::coalescer::{Coalescer, CoalescerStats, Priority};
use crate::config::LinkConfig;
use crate::error::Result;
use crate::grid::GridSync;
use crate::handshake::{ConnectionState, Handshake, HandshakeAction};
use crate::overview::{Overview, OverviewWindow};
use crate::ring::{NavDirection, RingWindow, SessionRing, WindowChange};
use crate::source::{CellKey, StateSource, SubscriptionHandle};

/// Controller input the host should act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    FireClip { track: u16, scene: u16 },
    StopClip { track: u16, scene: u16 },
    FireScene { scene: u16 },
    SelectCell { track: u16, scene: u16 },
    /// A known command the link does not interpret itself.
    Forward { command: u8, payload: Vec<u8> },
}

/// Snapshot of link health.
#[derive(Debug, Clone, Serialize)]
pub struct LinkStats {
    pub state: ConnectionState,
    /// Valid frames accepted from the controller.
    pub frames_received: u64,
    /// Inbound messages dropped by the codec, by reason.
    pub frames_dropped: BTreeMap<&'static str, u64>,
    /// Valid frames refused by the command table.
    pub frames_rejected: u64,
    /// Commands with no table entry, routed to the no-op handler.
    pub frames_unrouted: u64,
    pub frames_sent: u64,
    pub send_failures: u64,
    pub requests: u64,
    pub subscriptions: usize,
    pub coalescer: CoalescerStats,
}

#[derive(Debug, Default)]
struct Counters {
    received: u64,
    dropped: BTreeMap<&'static str, u64>,
    rejected: u64,
    unrouted: u64,
    sent: u64,
    send_failures: u64,
    requests: u64,
}

/// A controller link over any byte sink.
pub struct Link<W, S> {
    writer: FrameWriter<W>,
    source: S,
    registry: CommandRegistry,
    handshake: Handshake,
    coalescer: Coalescer,
    ring: SessionRing,
    grid: GridSync,
    overview: Overview,
    subscriptions: BTreeMap<CellKey, SubscriptionHandle>,
    selection: Option<CellKey>,
    requests: VecDeque<HostRequest>,
    rx: BytesMut,
    max_message_size: usize,
    counters: Counters,
}

impl<W: Write, S: StateSource> Link<W, S> {
    /// Build a link in `Disconnected`. Call [`open`](Link::open) to start
    /// the handshake.
    pub fn new(transport: W, source: S, config: &LinkConfig) -> Result<Self> {
        config.validate()?;
        let (tracks, scenes) = source.totals();
        let geometry = config.grid;
        let frame_config = FrameConfig::default();
        let mut link = Self {
            max_message_size: frame_config.max_message_size(),
            writer: FrameWriter::with_config(transport, frame_config),
            source,
            registry: CommandRegistry::canonical(config.registry),
            handshake: Handshake::new(&config.handshake)?,
            coalescer: Coalescer::new(config.coalescer),
            ring: SessionRing::new(geometry.rows, geometry.columns, tracks, scenes),
            grid: GridSync::new(geometry),
            overview: Overview::new(geometry),
            subscriptions: BTreeMap::new(),
            selection: None,
            requests: VecDeque::new(),
            rx: BytesMut::new(),
            counters: Counters::default(),
        };
        link.sync_subscriptions();
        link.grid.reload(&link.ring.window(), &link.source);
        Ok(link)
    }

    /// Replace the command table, e.g. with one loaded from a file.
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Send the first handshake.
    pub fn open(&mut self, now: Instant) {
        let actions = self.handshake.open(now);
        self.apply(actions, now);
    }

    /// Explicit teardown. Sends `DISCONNECT` if connected and re-arms the
    /// handshake retry.
    pub fn disconnect(&mut self, now: Instant) {
        let actions = self.handshake.disconnect(now);
        self.apply(actions, now);
    }

    /// Drive timers: handshake retries and the coalescer flush.
    pub fn tick(&mut self, now: Instant) {
        let actions = self.handshake.tick(now);
        self.apply(actions, now);
        if self.handshake.is_connected() {
            let out = self.coalescer.flush(now);
            for item in out {
                self.send_now(item.command, &item.payload);
            }
        }
    }

    /// Earliest instant at which [`tick`](Link::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let flush = if self.handshake.is_connected() {
            self.coalescer.next_flush_at()
        } else {
            None
        };
        match (self.handshake.next_retry(), flush) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Feed raw bytes from a MIDI input that may interleave other traffic.
    pub fn on_bytes(&mut self, data: &[u8], now: Instant) {
        self.rx.extend_from_slice(data);
        loop {
            match split_sysex(&mut self.rx, self.max_message_size) {
                Ok(Some(message)) => self.on_message(&message, now),
                Ok(None) => break,
                Err(err) => self.record_drop(&err),
            }
        }
    }

    /// Feed one complete SysEx message.
    pub fn on_message(&mut self, message: &[u8], now: Instant) {
        let frame = match decode_frame(message) {
            Ok(frame) => frame,
            Err(err) => {
                self.record_drop(&err);
                return;
            }
        };
        self.counters.received += 1;

        let known = match self.registry.validate(&frame, true) {
            Ok(Route::Known(descriptor)) => {
                trace!(
                    command = %descriptor.name,
                    sequence = frame.sequence,
                    len = frame.payload.len(),
                    "frame received"
                );
                true
            }
            Ok(Route::Unknown) => false,
            Err(err) => {
                self.counters.rejected += 1;
                debug!(command = frame.command, error = %err, "frame rejected");
                return;
            }
        };

        let actions = self.handshake.on_frame(frame.command, now);
        self.apply(actions, now);

        if known {
            self.dispatch(&frame);
        } else {
            self.counters.unrouted += 1;
            debug!(command = frame.command, "no handler for command");
        }
    }

    /// A subscribed cell changed in the host. Schedules a grid update.
    pub fn on_state_change(&mut self, key: CellKey) {
        let mut dirty = false;
        if self.ring.contains(key.track, key.scene) {
            if let Some((ring_track, ring_scene)) = self.ring.to_ring(key.track, key.scene) {
                let cell = self.source.cell(key);
                dirty |= self.grid.set_cell(ring_track, ring_scene, cell);
            }
        }
        if self.overview.is_active() && self.overview.covers(key) {
            dirty = true;
        }
        if dirty {
            self.queue_view();
        }
    }

    /// Move the ring, or the overview viewport when overview is showing.
    pub fn navigate(&mut self, direction: NavDirection) {
        if self.overview.is_active() {
            let (tracks, scenes) = self.totals();
            if self.overview.navigate(direction, tracks, scenes) {
                self.sync_subscriptions();
                self.queue_view();
            }
        } else if let Some(change) = self.ring.navigate(direction) {
            self.on_window_change(change);
        }
    }

    /// The host selected a track and scene. Shifts the ring minimally and
    /// reports the selection to the controller.
    pub fn follow_selection(&mut self, track: u16, scene: u16) {
        self.selection = Some(CellKey::new(track, scene));
        match self.ring.follow_selection(track, scene) {
            Some(change) => self.on_window_change(change),
            None => self.queue_selection(),
        }
    }

    /// Centre the ring on a cell.
    pub fn jump_to(&mut self, track: u16, scene: u16) {
        if let Some(change) = self.ring.jump_to(track, scene) {
            self.on_window_change(change);
        }
    }

    /// The host's track or scene count changed.
    pub fn set_session_size(&mut self, tracks: u16, scenes: u16) {
        let change = self.ring.set_session_size(tracks, scenes);
        if self.overview.is_active() {
            self.overview.recenter(&self.ring.window());
        }
        match change {
            Some(change) => self.on_window_change(change),
            None => {
                self.sync_subscriptions();
                self.queue_view();
            }
        }
    }

    /// Enter or leave overview mode.
    pub fn toggle_overview(&mut self) {
        let active = self.overview.toggle(&self.ring.window());
        info!(active, zoom = self.overview.zoom(), "overview toggled");
        self.sync_subscriptions();
        self.queue_view();
    }

    /// Step the overview zoom. No effect outside overview mode.
    pub fn cycle_zoom(&mut self) {
        if !self.overview.is_active() {
            return;
        }
        let zoom = self.overview.cycle_zoom(&self.ring.window());
        debug!(zoom, "overview zoom changed");
        self.sync_subscriptions();
        self.queue_view();
    }

    /// Queue an arbitrary host-to-device update under its default priority.
    pub fn queue(&mut self, command: u8, key: u32, payload: impl Into<Bytes>) -> Result<()> {
        self.queue_with_priority(command, key, payload, Priority::for_command(command))
    }

    /// Queue an update with an explicit priority.
    pub fn queue_with_priority(
        &mut self,
        command: u8,
        key: u32,
        payload: impl Into<Bytes>,
        priority: Priority,
    ) -> Result<()> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            }
            .into());
        }
        if let Some(offset) = payload.iter().position(|b| *b > 0x7F) {
            return Err(FrameError::NonSevenBit {
                offset,
                byte: payload[offset],
            }
            .into());
        }
        self.coalescer.queue(command, key, payload, priority);
        Ok(())
    }

    /// Take the controller requests received since the last call.
    pub fn drain_requests(&mut self) -> Vec<HostRequest> {
        self.requests.drain(..).collect()
    }

    pub fn state(&self) -> ConnectionState {
        self.handshake.state()
    }

    pub fn is_connected(&self) -> bool {
        self.handshake.is_connected()
    }

    pub fn ring(&self) -> RingWindow {
        self.ring.window()
    }

    pub fn overview(&self) -> OverviewWindow {
        self.overview.window()
    }

    pub fn grid(&self) -> &GridSync {
        &self.grid
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the host state. Report changes to subscribed
    /// cells through [`on_state_change`](Link::on_state_change).
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &W {
        self.writer.get_ref()
    }

    pub fn transport_mut(&mut self) -> &mut W {
        self.writer.get_mut()
    }

    pub fn stats(&self) -> LinkStats {
        LinkStats {
            state: self.handshake.state(),
            frames_received: self.counters.received,
            frames_dropped: self.counters.dropped.clone(),
            frames_rejected: self.counters.rejected,
            frames_unrouted: self.counters.unrouted,
            frames_sent: self.counters.sent,
            send_failures: self.counters.send_failures,
            requests: self.counters.requests,
            subscriptions: self.subscriptions.len(),
            coalescer: self.coalescer.stats(),
        }
    }

    fn dispatch(&mut self, frame: &Frame) {
        let payload = &frame.payload;
        let pad = || Some((u16::from(*payload.first()?), u16::from(*payload.get(1)?)));
        match frame.command {
            HANDSHAKE | HANDSHAKE_REPLY | DISCONNECT | PING_TEST => {}
            RING_NAVIGATE => match payload.first().and_then(|b| NavDirection::from_wire(*b)) {
                Some(direction) => self.navigate(direction),
                None => debug!(?payload, "invalid navigation direction"),
            },
            RING_SELECT => {
                if let Some((row, column)) = pad() {
                    self.select_pad(row, column);
                }
            }
            CLIP_TRIGGER => {
                if let Some((row, column)) = pad() {
                    if self.overview.is_active() {
                        self.select_pad(row, column);
                    } else if let Some(key) = self.pad_to_cell(row, column) {
                        self.request(HostRequest::FireClip {
                            track: key.track,
                            scene: key.scene,
                        });
                    }
                }
            }
            CLIP_STOP => {
                if let Some(key) = pad().and_then(|(row, column)| self.pad_to_cell(row, column)) {
                    self.request(HostRequest::StopClip {
                        track: key.track,
                        scene: key.scene,
                    });
                }
            }
            SCENE_FIRE => {
                if let Some(ring_scene) = payload.first() {
                    let scene = self.ring.scene_offset() + u16::from(*ring_scene);
                    if scene < self.ring.window().total_scenes {
                        self.request(HostRequest::FireScene { scene });
                    }
                }
            }
            OVERVIEW_TOGGLE => self.toggle_overview(),
            OVERVIEW_ZOOM => self.cycle_zoom(),
            command => self.request(HostRequest::Forward {
                command,
                payload: payload.to_vec(),
            }),
        }
    }

    /// A pad tap that selects: a cell in ring mode, a jump in overview mode.
    fn select_pad(&mut self, row: u16, column: u16) {
        if self.overview.is_active() {
            if let Some(target) = self.overview.pad_target(row, column) {
                debug!(track = target.track, scene = target.scene, "overview jump");
                self.jump_to(target.track, target.scene);
            }
        } else if let Some(key) = self.pad_to_cell(row, column) {
            self.request(HostRequest::SelectCell {
                track: key.track,
                scene: key.scene,
            });
        }
    }

    fn pad_to_cell(&self, row: u16, column: u16) -> Option<CellKey> {
        let key = self.ring.to_absolute(row, column);
        if self.ring.contains(key.track, key.scene) {
            Some(key)
        } else {
            debug!(row, column, "pad outside session");
            None
        }
    }

    fn request(&mut self, request: HostRequest) {
        self.counters.requests += 1;
        self.requests.push_back(request);
    }

    fn on_window_change(&mut self, change: WindowChange) {
        debug!(
            track_offset = change.after.track_offset,
            scene_offset = change.after.scene_offset,
            entered = change.entered.len(),
            left = change.left.len(),
            "ring moved"
        );
        self.sync_subscriptions();
        self.grid.reload(&self.ring.window(), &self.source);
        let position = self.ring.window().position_payload();
        self.coalescer
            .queue(RING_POSITION, 0, position.to_vec(), Priority::High);
        self.queue_selection();
        self.queue_view();
    }

    fn queue_selection(&mut self) {
        let Some(selection) = self.selection else {
            return;
        };
        let w = self.ring.window();
        let track = select_payload(selection.track, w.track_offset, w.width);
        let scene = select_payload(selection.scene, w.scene_offset, w.height);
        self.coalescer
            .queue(TRACK_SELECT, 0, track.to_vec(), Priority::High);
        self.coalescer
            .queue(SCENE_SELECT, 0, scene.to_vec(), Priority::High);
    }

    /// Queue whichever full-grid view is showing.
    fn queue_view(&mut self) {
        if self.overview.is_active() {
            let ring = self.ring.window();
            let pads = self.overview.render(&ring, &self.source);
            let meta = self
                .overview
                .window()
                .metadata_payload(ring.total_tracks, ring.total_scenes);
            self.coalescer
                .queue(NEOTRELLIS_CLIP_GRID, 0, pads, Priority::Normal);
            self.coalescer
                .queue(SESSION_OVERVIEW, 0, meta.to_vec(), Priority::Normal);
        } else {
            let pads = self.grid.render();
            self.coalescer
                .queue(NEOTRELLIS_CLIP_GRID, 0, pads, Priority::Normal);
        }
    }

    fn state_dump(&mut self, now: Instant) {
        self.grid.reload(&self.ring.window(), &self.source);
        self.coalescer.clear_history();
        let position = self.ring.window().position_payload();
        self.coalescer
            .queue(RING_POSITION, 0, position.to_vec(), Priority::High);
        self.queue_selection();
        self.queue_view();
        let out = self.coalescer.force_flush(now);
        info!(frames = out.len(), "sending state dump");
        for item in out {
            self.send_now(item.command, &item.payload);
        }
    }

    fn apply(&mut self, actions: Vec<HandshakeAction>, now: Instant) {
        for action in actions {
            match action {
                HandshakeAction::Send { command, payload } => self.send_now(command, &payload),
                HandshakeAction::StateDump => self.state_dump(now),
            }
        }
    }

    fn send_now(&mut self, command: u8, payload: &[u8]) {
        match self.writer.send(command, payload) {
            Ok(sequence) => {
                self.counters.sent += 1;
                trace!(command = command_name(command).unwrap_or("unknown"), sequence, "frame sent");
            }
            Err(err) => {
                self.counters.send_failures += 1;
                warn!(
                    command = command_name(command).unwrap_or("unknown"),
                    error = %err,
                    "dropping outbound frame"
                );
            }
        }
    }

    fn record_drop(&mut self, err: &FrameError) {
        *self.counters.dropped.entry(err.kind()).or_default() += 1;
        debug!(reason = err.kind(), error = %err, "dropping inbound message");
    }

    fn totals(&self) -> (u16, u16) {
        let w = self.ring.window();
        (w.total_tracks, w.total_scenes)
    }

    /// Subscribe to exactly the cells on screen: the ring, plus the
    /// overview viewport while overview is showing.
    fn sync_subscriptions(&mut self) {
        let mut wanted: BTreeSet<CellKey> = self.ring.window().cells();
        if self.overview.is_active() {
            let (tracks, scenes) = self.totals();
            wanted.extend(self.overview.cells(tracks, scenes));
        }

        let stale: Vec<CellKey> = self
            .subscriptions
            .keys()
            .filter(|key| !wanted.contains(key))
            .copied()
            .collect();
        for key in stale {
            if let Some(handle) = self.subscriptions.remove(&key) {
                self.source.unsubscribe(handle);
            }
        }
        for key in wanted {
            if !self.subscriptions.contains_key(&key) {
                let handle = self.source.subscribe(key);
                self.subscriptions.insert(key, handle);
            }
        }
    }
}

impl<S: StateSource> Link<MidiPort, S> {
    /// Open a MIDI output port for best-effort, non-blocking writes.
    pub fn open_port(path: impl AsRef<Path>, source: S, config: &LinkConfig) -> Result<Self> {
        let port = MidiPort::open_with(path, PortOptions::output())?;
        Self::new(port, source, config)
    }
}

/// `TRACK_SELECT` / `SCENE_SELECT` payload: `[relative, 1]` inside the ring,
/// `[absolute, 0]` outside it.
fn select_payload(index: u16, offset: u16, size: u16) -> [u8; 2] {
    if index >= offset && index < offset.saturating_add(size) {
        [((index - offset) & 0x7F) as u8, 1]
    } else {
        [index.min(0x7F) as u8, 0]
    }
}
