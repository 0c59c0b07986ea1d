//! Session ring: the window of tracks and scenes mirrored on the pad grid.
//!
//! The ring keeps `track_offset + width <= total_tracks` and
//! `scene_offset + height <= total_scenes` whenever the session is at
//! least as large as the ring. A smaller session pins the offset at zero
//! and leaves the surplus pads dark.

use std::collections::BTreeSet;

use pushclone_frame::value::encode14;
use serde::{Deserialize, Serialize};

use crate::source::CellKey;

/// Inbound `RING_NAVIGATE` direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavDirection {
    Left,
    Right,
    Up,
    Down,
}

impl NavDirection {
    /// Decode the wire byte: 0 left, 1 right, 2 up, 3 down.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(NavDirection::Left),
            1 => Some(NavDirection::Right),
            2 => Some(NavDirection::Up),
            3 => Some(NavDirection::Down),
            _ => None,
        }
    }

    /// Signed `(tracks, scenes)` step.
    fn delta(self) -> (i32, i32) {
        match self {
            NavDirection::Left => (-1, 0),
            NavDirection::Right => (1, 0),
            NavDirection::Up => (0, -1),
            NavDirection::Down => (0, 1),
        }
    }
}

/// Snapshot of the ring's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingWindow {
    pub track_offset: u16,
    pub scene_offset: u16,
    /// Tracks covered by the ring.
    pub width: u16,
    /// Scenes covered by the ring.
    pub height: u16,
    pub total_tracks: u16,
    pub total_scenes: u16,
}

impl RingWindow {
    /// `RING_POSITION` payload: four 14-bit values, then width and height.
    pub fn position_payload(&self) -> [u8; 6] {
        let (t_msb, t_lsb) = encode14(self.track_offset);
        let (s_msb, s_lsb) = encode14(self.scene_offset);
        [
            t_msb,
            t_lsb,
            s_msb,
            s_lsb,
            self.width.min(0x7F) as u8,
            self.height.min(0x7F) as u8,
        ]
    }

    pub fn contains(&self, track: u16, scene: u16) -> bool {
        track >= self.track_offset
            && track < self.track_end()
            && scene >= self.scene_offset
            && scene < self.scene_end()
    }

    /// Cells that are both inside the ring and inside the session.
    pub fn cells(&self) -> BTreeSet<CellKey> {
        let mut cells = BTreeSet::new();
        for track in self.track_offset..self.track_end() {
            for scene in self.scene_offset..self.scene_end() {
                cells.insert(CellKey::new(track, scene));
            }
        }
        cells
    }

    fn track_end(&self) -> u16 {
        self.track_offset
            .saturating_add(self.width)
            .min(self.total_tracks)
    }

    fn scene_end(&self) -> u16 {
        self.scene_offset
            .saturating_add(self.height)
            .min(self.total_scenes)
    }
}

/// Result of a ring move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowChange {
    pub before: RingWindow,
    pub after: RingWindow,
    /// Cells that became visible.
    pub entered: Vec<CellKey>,
    /// Cells that are no longer visible.
    pub left: Vec<CellKey>,
}

impl WindowChange {
    fn between(before: RingWindow, after: RingWindow) -> Self {
        let old = before.cells();
        let new = after.cells();
        Self {
            before,
            after,
            entered: new.difference(&old).copied().collect(),
            left: old.difference(&new).copied().collect(),
        }
    }

    pub fn moved(&self) -> bool {
        self.before.track_offset != self.after.track_offset
            || self.before.scene_offset != self.after.scene_offset
    }
}

/// Movable window over the host session.
#[derive(Debug, Clone)]
pub struct SessionRing {
    window: RingWindow,
}

impl SessionRing {
    /// Create a ring at the origin. `width` and `height` are at least 1.
    pub fn new(width: u16, height: u16, total_tracks: u16, total_scenes: u16) -> Self {
        Self {
            window: RingWindow {
                track_offset: 0,
                scene_offset: 0,
                width: width.max(1),
                height: height.max(1),
                total_tracks,
                total_scenes,
            },
        }
    }

    pub fn window(&self) -> RingWindow {
        self.window
    }

    pub fn track_offset(&self) -> u16 {
        self.window.track_offset
    }

    pub fn scene_offset(&self) -> u16 {
        self.window.scene_offset
    }

    /// Move by one track or scene. Clamped at the session edges.
    pub fn navigate(&mut self, direction: NavDirection) -> Option<WindowChange> {
        let (dt, ds) = direction.delta();
        let track = i32::from(self.window.track_offset) + dt;
        let scene = i32::from(self.window.scene_offset) + ds;
        self.move_to(track, scene)
    }

    /// Shift the ring the minimum amount needed to show `(track, scene)`.
    pub fn follow_selection(&mut self, track: u16, scene: u16) -> Option<WindowChange> {
        let w = self.window;
        let track_offset = minimal_shift(w.track_offset, w.width, track);
        let scene_offset = minimal_shift(w.scene_offset, w.height, scene);
        self.move_to(i32::from(track_offset), i32::from(scene_offset))
    }

    /// Place the ring so `(track, scene)` sits near its centre.
    pub fn jump_to(&mut self, track: u16, scene: u16) -> Option<WindowChange> {
        let track = i32::from(track) - i32::from(self.window.width / 2);
        let scene = i32::from(scene) - i32::from(self.window.height / 2);
        self.move_to(track, scene)
    }

    /// Apply new session totals and re-clamp the offsets.
    pub fn set_session_size(&mut self, tracks: u16, scenes: u16) -> Option<WindowChange> {
        let before = self.window;
        self.window.total_tracks = tracks;
        self.window.total_scenes = scenes;
        self.window.track_offset = clamp_offset(
            i32::from(before.track_offset),
            self.window.width,
            tracks,
        );
        self.window.scene_offset = clamp_offset(
            i32::from(before.scene_offset),
            self.window.height,
            scenes,
        );
        (before != self.window).then(|| WindowChange::between(before, self.window))
    }

    /// Absolute cell for a ring-relative position.
    pub fn to_absolute(&self, ring_track: u16, ring_scene: u16) -> CellKey {
        CellKey::new(
            self.window.track_offset.saturating_add(ring_track),
            self.window.scene_offset.saturating_add(ring_scene),
        )
    }

    /// Ring-relative position of an absolute cell, if inside the ring.
    pub fn to_ring(&self, track: u16, scene: u16) -> Option<(u16, u16)> {
        let w = self.window;
        let inside = track >= w.track_offset
            && track < w.track_offset.saturating_add(w.width)
            && scene >= w.scene_offset
            && scene < w.scene_offset.saturating_add(w.height);
        inside.then(|| (track - w.track_offset, scene - w.scene_offset))
    }

    pub fn contains(&self, track: u16, scene: u16) -> bool {
        self.window.contains(track, scene)
    }

    fn move_to(&mut self, track: i32, scene: i32) -> Option<WindowChange> {
        let before = self.window;
        self.window.track_offset = clamp_offset(track, before.width, before.total_tracks);
        self.window.scene_offset = clamp_offset(scene, before.height, before.total_scenes);
        (before != self.window).then(|| WindowChange::between(before, self.window))
    }
}

fn minimal_shift(offset: u16, size: u16, target: u16) -> u16 {
    if target < offset {
        target
    } else if target >= offset.saturating_add(size) {
        target + 1 - size
    } else {
        offset
    }
}

fn clamp_offset(offset: i32, size: u16, total: u16) -> u16 {
    let max = i32::from(total.saturating_sub(size));
    offset.clamp(0, max) as u16
}
