//! Zoomed-out view of the session on the same pad grid.
//!
//! At zoom `z` each pad summarises a `z x z` block of cells. The viewport
//! is centred on the ring when overview opens or the zoom changes, and
//! pads covering the ring are highlighted.

use std::collections::BTreeSet;

use bytes::Bytes;
use pushclone_frame::value::encode14;
use pushclone_frame::Rgb;
use serde::Serialize;

use crate::grid::{render_colors, GridGeometry};
use crate::ring::{NavDirection, RingWindow};
use crate::source::{CellKey, ClipState, StateSource};

/// Supported zoom levels, in cycle order.
pub const ZOOM_LEVELS: [u16; 4] = [1, 2, 4, 8];

const PLAYING: Rgb = Rgb::new(0, 255, 0);
const RECORDING: Rgb = Rgb::new(255, 0, 0);
const QUEUED: Rgb = Rgb::new(255, 255, 0);

/// Share of white mixed into ring pads, in tenths.
const HIGHLIGHT_TENTHS: u32 = 3;
const CLIP_BASE_INTENSITY: f32 = 0.3;
const CLIP_DENSITY_INTENSITY: f32 = 0.4;

/// Snapshot of the overview viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverviewWindow {
    pub active: bool,
    pub zoom: u16,
    pub track_offset: u16,
    pub scene_offset: u16,
}

impl OverviewWindow {
    /// `SESSION_OVERVIEW` payload: zoom, then 14-bit track offset, scene
    /// offset, total tracks and total scenes.
    pub fn metadata_payload(&self, total_tracks: u16, total_scenes: u16) -> [u8; 9] {
        let mut out = [0u8; 9];
        out[0] = self.zoom.min(0x7F) as u8;
        let fields = [
            self.track_offset,
            self.scene_offset,
            total_tracks,
            total_scenes,
        ];
        for (i, value) in fields.into_iter().enumerate() {
            let (msb, lsb) = encode14(value);
            out[1 + i * 2] = msb;
            out[2 + i * 2] = lsb;
        }
        out
    }
}

/// Overview mode state.
#[derive(Debug, Clone)]
pub struct Overview {
    geometry: GridGeometry,
    window: OverviewWindow,
}

impl Overview {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            window: OverviewWindow {
                active: false,
                zoom: ZOOM_LEVELS[1],
                track_offset: 0,
                scene_offset: 0,
            },
        }
    }

    pub fn window(&self) -> OverviewWindow {
        self.window
    }

    pub fn is_active(&self) -> bool {
        self.window.active
    }

    pub fn zoom(&self) -> u16 {
        self.window.zoom
    }

    /// Tracks covered by the viewport.
    pub fn visible_tracks(&self) -> u16 {
        self.geometry.rows.saturating_mul(self.window.zoom)
    }

    /// Scenes covered by the viewport.
    pub fn visible_scenes(&self) -> u16 {
        self.geometry.columns.saturating_mul(self.window.zoom)
    }

    /// Enter overview centred on the ring.
    pub fn activate(&mut self, ring: &RingWindow) {
        self.window.active = true;
        self.recenter(ring);
    }

    pub fn deactivate(&mut self) {
        self.window.active = false;
    }

    /// Flip overview mode. Returns the new state.
    pub fn toggle(&mut self, ring: &RingWindow) -> bool {
        if self.window.active {
            self.deactivate();
        } else {
            self.activate(ring);
        }
        self.window.active
    }

    /// Step to the next zoom level, wrapping after the last.
    pub fn cycle_zoom(&mut self, ring: &RingWindow) -> u16 {
        let position = ZOOM_LEVELS
            .iter()
            .position(|z| *z == self.window.zoom)
            .unwrap_or(0);
        self.window.zoom = ZOOM_LEVELS[(position + 1) % ZOOM_LEVELS.len()];
        self.recenter(ring);
        self.window.zoom
    }

    /// Set a zoom level. Unsupported levels are ignored.
    pub fn set_zoom(&mut self, zoom: u16, ring: &RingWindow) -> bool {
        if !ZOOM_LEVELS.contains(&zoom) {
            return false;
        }
        self.window.zoom = zoom;
        self.recenter(ring);
        true
    }

    /// Centre the viewport on the ring, clamped to the session.
    pub fn recenter(&mut self, ring: &RingWindow) {
        let tracks = self.visible_tracks();
        let scenes = self.visible_scenes();
        self.window.track_offset = clamp_viewport(
            i32::from(ring.track_offset) - i32::from(tracks / 2),
            tracks,
            ring.total_tracks,
        );
        self.window.scene_offset = clamp_viewport(
            i32::from(ring.scene_offset) - i32::from(scenes / 2),
            scenes,
            ring.total_scenes,
        );
    }

    /// Move the viewport one zoom step. Returns `true` if it moved.
    pub fn navigate(&mut self, direction: NavDirection, total_tracks: u16, total_scenes: u16) -> bool {
        let step = i32::from(self.window.zoom);
        let (dt, ds) = match direction {
            NavDirection::Left => (-step, 0),
            NavDirection::Right => (step, 0),
            NavDirection::Up => (0, -step),
            NavDirection::Down => (0, step),
        };
        let before = self.window;
        self.window.track_offset = clamp_viewport(
            i32::from(before.track_offset) + dt,
            self.visible_tracks(),
            total_tracks,
        );
        self.window.scene_offset = clamp_viewport(
            i32::from(before.scene_offset) + ds,
            self.visible_scenes(),
            total_scenes,
        );
        before != self.window
    }

    /// First cell of the block behind a pad.
    pub fn pad_target(&self, row: u16, column: u16) -> Option<CellKey> {
        (row < self.geometry.rows && column < self.geometry.columns).then(|| {
            CellKey::new(
                self.window
                    .track_offset
                    .saturating_add(row.saturating_mul(self.window.zoom)),
                self.window
                    .scene_offset
                    .saturating_add(column.saturating_mul(self.window.zoom)),
            )
        })
    }

    /// Whether `key` is summarised by some pad.
    pub fn covers(&self, key: CellKey) -> bool {
        let w = self.window;
        key.track >= w.track_offset
            && key.track < w.track_offset.saturating_add(self.visible_tracks())
            && key.scene >= w.scene_offset
            && key.scene < w.scene_offset.saturating_add(self.visible_scenes())
    }

    /// Cells under the viewport that exist in the session.
    pub fn cells(&self, total_tracks: u16, total_scenes: u16) -> BTreeSet<CellKey> {
        let w = self.window;
        let track_end = w
            .track_offset
            .saturating_add(self.visible_tracks())
            .min(total_tracks);
        let scene_end = w
            .scene_offset
            .saturating_add(self.visible_scenes())
            .min(total_scenes);
        let mut cells = BTreeSet::new();
        for track in w.track_offset..track_end {
            for scene in w.scene_offset..scene_end {
                cells.insert(CellKey::new(track, scene));
            }
        }
        cells
    }

    /// One colour per pad, row-major.
    pub fn colors<S: StateSource + ?Sized>(&self, ring: &RingWindow, source: &S) -> Vec<Rgb> {
        let zoom = self.window.zoom;
        let mut colors = Vec::with_capacity(self.geometry.pads());
        for row in 0..self.geometry.rows {
            for column in 0..self.geometry.columns {
                let Some(start) = self.pad_target(row, column) else {
                    colors.push(Rgb::BLACK);
                    continue;
                };
                let mut block = BlockSummary::default();
                let mut overlaps_ring = false;
                for track in start.track..start.track.saturating_add(zoom) {
                    for scene in start.scene..start.scene.saturating_add(zoom) {
                        if ring.contains(track, scene) {
                            overlaps_ring = true;
                        }
                        if track < ring.total_tracks && scene < ring.total_scenes {
                            block.add(source, CellKey::new(track, scene));
                        }
                    }
                }
                let color = block.color();
                colors.push(if overlaps_ring { highlight(color) } else { color });
            }
        }
        colors
    }

    /// Full-grid payload for the overview.
    pub fn render<S: StateSource + ?Sized>(&self, ring: &RingWindow, source: &S) -> Bytes {
        render_colors(&self.colors(ring, source))
    }
}

/// Mix a pad colour toward white to mark the ring's position.
pub fn highlight(color: Rgb) -> Rgb {
    let mix = |c: u8| {
        let v = u32::from(c) * (10 - HIGHLIGHT_TENTHS) + 255 * HIGHLIGHT_TENTHS;
        ((v + 5) / 10).min(255) as u8
    };
    Rgb::new(mix(color.r), mix(color.g), mix(color.b))
}

#[derive(Debug, Default)]
struct BlockSummary {
    slots: u32,
    clips: u32,
    playing: bool,
    recording: bool,
    queued: bool,
    sum: [u32; 3],
}

impl BlockSummary {
    fn add<S: StateSource + ?Sized>(&mut self, source: &S, key: CellKey) {
        self.slots += 1;
        let cell = source.cell(key);
        match cell.state {
            ClipState::Empty => return,
            ClipState::Playing => self.playing = true,
            ClipState::Recording => self.recording = true,
            ClipState::Queued => self.queued = true,
            ClipState::Stopped => {}
        }
        self.clips += 1;
        let (r, g, b) = cell.color;
        self.sum[0] += u32::from(r);
        self.sum[1] += u32::from(g);
        self.sum[2] += u32::from(b);
    }

    fn color(&self) -> Rgb {
        if self.playing {
            PLAYING
        } else if self.recording {
            RECORDING
        } else if self.queued {
            QUEUED
        } else if self.clips > 0 {
            let avg = |sum: u32| (sum / self.clips) as u8;
            let density = self.clips as f32 / self.slots as f32;
            Rgb::new(avg(self.sum[0]), avg(self.sum[1]), avg(self.sum[2]))
                .scaled(CLIP_BASE_INTENSITY + CLIP_DENSITY_INTENSITY * density)
        } else {
            Rgb::BLACK
        }
    }
}

fn clamp_viewport(offset: i32, visible: u16, total: u16) -> u16 {
    let max = i32::from(total.saturating_sub(visible));
    offset.clamp(0, max) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::SessionRing;
    use crate::source::{CellState, MemorySource};

    fn overview() -> Overview {
        Overview::new(GridGeometry::default())
    }

    #[test]
    fn zoom_cycles_and_wraps() {
        let ring = SessionRing::new(4, 8, 64, 64).window();
        let mut ov = overview();
        assert_eq!(ov.zoom(), 2);
        assert_eq!(ov.cycle_zoom(&ring), 4);
        assert_eq!(ov.cycle_zoom(&ring), 8);
        assert_eq!(ov.cycle_zoom(&ring), 1);
        assert_eq!(ov.cycle_zoom(&ring), 2);

        assert!(!ov.set_zoom(3, &ring));
        assert!(ov.set_zoom(8, &ring));
        assert_eq!(ov.visible_tracks(), 32);
        assert_eq!(ov.visible_scenes(), 64);
    }

    #[test]
    fn viewport_centres_on_ring_and_clamps() {
        let mut ring = SessionRing::new(4, 8, 64, 64);
        ring.jump_to(22, 34);
        let mut ov = overview();
        ov.activate(&ring.window());

        // zoom 2: 8 tracks by 16 scenes visible
        let w = ov.window();
        assert!(w.active);
        assert_eq!(w.track_offset, 20 - 4);
        assert_eq!(w.scene_offset, 30 - 8);

        ring.jump_to(63, 63);
        ov.recenter(&ring.window());
        assert_eq!(ov.window().track_offset, 64 - 8);
        assert_eq!(ov.window().scene_offset, 64 - 16);
    }

    #[test]
    fn small_session_pins_viewport() {
        let ring = SessionRing::new(4, 8, 3, 5).window();
        let mut ov = overview();
        ov.activate(&ring);
        assert_eq!((ov.window().track_offset, ov.window().scene_offset), (0, 0));
        assert!(!ov.navigate(NavDirection::Right, 3, 5));
    }

    #[test]
    fn navigate_steps_by_zoom() {
        let ring = SessionRing::new(4, 8, 64, 64).window();
        let mut ov = overview();
        ov.activate(&ring);
        ov.set_zoom(4, &ring);
        assert!(ov.navigate(NavDirection::Right, 64, 64));
        assert!(ov.navigate(NavDirection::Down, 64, 64));
        assert_eq!((ov.window().track_offset, ov.window().scene_offset), (4, 4));
        assert!(ov.navigate(NavDirection::Left, 64, 64));
        assert_eq!(ov.window().track_offset, 0);
    }

    #[test]
    fn pad_target_scales_by_zoom() {
        let ring = SessionRing::new(4, 8, 64, 64).window();
        let mut ov = overview();
        ov.activate(&ring);
        assert_eq!(ov.pad_target(1, 3), Some(CellKey::new(2, 6)));
        assert_eq!(ov.pad_target(4, 0), None);
        assert!(ov.covers(CellKey::new(7, 15)));
        assert!(!ov.covers(CellKey::new(8, 0)));
    }

    #[test]
    fn pad_colour_priorities() {
        let mut source = MemorySource::new(64, 64);
        // pad (0, 2) covers tracks 0-1, scenes 4-5: one playing, one recording
        source.set_cell(CellKey::new(0, 4), CellState::new(ClipState::Recording, Rgb::WHITE));
        source.set_cell(CellKey::new(1, 5), CellState::new(ClipState::Playing, Rgb::WHITE));
        // pad (1, 3) covers tracks 2-3, scenes 6-7: recording beats queued
        source.set_cell(CellKey::new(2, 6), CellState::new(ClipState::Queued, Rgb::WHITE));
        source.set_cell(CellKey::new(3, 7), CellState::new(ClipState::Recording, Rgb::WHITE));
        // pad (2, 5): queued only
        source.set_cell(CellKey::new(4, 10), CellState::new(ClipState::Queued, Rgb::WHITE));
        // pad (3, 7): two stopped clips out of four slots
        source.set_cell(CellKey::new(6, 14), CellState::new(ClipState::Stopped, Rgb::new(200, 100, 0)));
        source.set_cell(CellKey::new(7, 15), CellState::new(ClipState::Stopped, Rgb::new(0, 100, 200)));

        let mut ring = SessionRing::new(4, 8, 64, 64);
        ring.jump_to(40, 40);
        let mut ov = overview();
        ov.activate(&SessionRing::new(4, 8, 64, 64).window());
        let colors = ov.colors(&ring.window(), &source);

        assert_eq!(colors[2], PLAYING);
        assert_eq!(colors[8 + 3], RECORDING);
        assert_eq!(colors[16 + 5], QUEUED);
        assert_eq!(colors[24 + 7], Rgb::new(100, 100, 100).scaled(0.5));
        assert_eq!(colors[1], Rgb::BLACK);
    }

    #[test]
    fn ring_overlap_is_highlighted() {
        let source = MemorySource::new(64, 64);
        let ring = SessionRing::new(4, 8, 64, 64).window();
        let mut ov = overview();
        ov.activate(&ring);
        let colors = ov.colors(&ring, &source);

        // ring covers tracks 0-3, scenes 0-7: rows 0-1, columns 0-3 at zoom 2
        let lit = highlight(Rgb::BLACK);
        assert_eq!(lit, Rgb::new(77, 77, 77));
        assert_eq!(colors[0], lit);
        assert_eq!(colors[8 + 3], lit);
        assert_eq!(colors[4], Rgb::BLACK);
        assert_eq!(colors[16], Rgb::BLACK);
        assert_eq!(ov.render(&ring, &source).len(), 192);
    }

    #[test]
    fn highlight_mixes_toward_white() {
        assert_eq!(highlight(Rgb::WHITE), Rgb::WHITE);
        assert_eq!(highlight(Rgb::new(100, 0, 200)), Rgb::new(147, 77, 217));
    }

    #[test]
    fn metadata_layout() {
        let w = OverviewWindow {
            active: true,
            zoom: 4,
            track_offset: 130,
            scene_offset: 2,
        };
        assert_eq!(w.metadata_payload(300, 20), [4, 1, 2, 0, 2, 2, 44, 0, 20]);
    }
}
