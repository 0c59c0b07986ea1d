//! Pad grid mirror of the session ring.
//!
//! One row per ring track, one column per ring scene. Pad `(track, scene)`
//! lives at index `track * columns + scene` and the whole grid goes out as
//! a single `NEOTRELLIS_CLIP_GRID` payload of six bytes per pad.

use bytes::{Bytes, BytesMut};
use pushclone_frame::value::put_color24;
use pushclone_frame::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{LinkError, Result};
use crate::ring::RingWindow;
use crate::source::{CellKey, CellState, ClipState, StateSource};

/// Bytes per pad in a full-grid payload.
pub const BYTES_PER_PAD: usize = 6;

const QUEUED_BOOST: u8 = 50;
const RECORDING_BOOST: u8 = 100;

/// Physical pad layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridGeometry {
    /// Pads per row. Each column is one ring scene.
    pub columns: u16,
    /// Rows of pads. Each row is one ring track.
    pub rows: u16,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self { columns: 8, rows: 4 }
    }
}

impl GridGeometry {
    pub fn pads(&self) -> usize {
        usize::from(self.columns) * usize::from(self.rows)
    }

    pub fn payload_len(&self) -> usize {
        self.pads() * BYTES_PER_PAD
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(LinkError::Config(
                "grid must have at least one row and one column".to_string(),
            ));
        }
        if self.payload_len() > pushclone_frame::MAX_PAYLOAD {
            return Err(LinkError::Config(format!(
                "grid of {} pads does not fit in one frame",
                self.pads()
            )));
        }
        Ok(())
    }

    /// Pad index for a ring-relative cell, if it is on the grid.
    pub fn index(&self, ring_track: u16, ring_scene: u16) -> Option<usize> {
        (ring_track < self.rows && ring_scene < self.columns)
            .then(|| usize::from(ring_track) * usize::from(self.columns) + usize::from(ring_scene))
    }
}

/// Pad colour for a cell, shaded by clip state.
///
/// Empty slots are dark. Stopped clips show at half brightness, playing
/// clips at full. Queued clips are brightened and recording clips pushed
/// toward red.
pub fn shade(cell: CellState) -> Rgb {
    let c = cell.rgb();
    match cell.state {
        ClipState::Empty => Rgb::BLACK,
        ClipState::Stopped => Rgb::new(c.r / 2, c.g / 2, c.b / 2),
        ClipState::Playing => c,
        ClipState::Queued => Rgb::new(
            c.r.saturating_add(QUEUED_BOOST),
            c.g.saturating_add(QUEUED_BOOST),
            c.b.saturating_add(QUEUED_BOOST),
        ),
        ClipState::Recording => Rgb::new(c.r.saturating_add(RECORDING_BOOST), c.g / 2, c.b / 2),
    }
}

/// Write one colour per pad into a full-grid payload.
pub fn render_colors(colors: &[Rgb]) -> Bytes {
    let mut buf = BytesMut::with_capacity(colors.len() * BYTES_PER_PAD);
    for color in colors {
        put_color24(&mut buf, *color);
    }
    buf.freeze()
}

/// Local copy of the ring's cell states.
#[derive(Debug, Clone)]
pub struct GridSync {
    geometry: GridGeometry,
    cells: Vec<CellState>,
}

impl GridSync {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            cells: vec![CellState::EMPTY; geometry.pads()],
        }
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    /// Update one pad from a ring-relative cell. Returns `true` if it changed.
    pub fn set_cell(&mut self, ring_track: u16, ring_scene: u16, cell: CellState) -> bool {
        let Some(index) = self.geometry.index(ring_track, ring_scene) else {
            return false;
        };
        if self.cells[index] == cell {
            return false;
        }
        self.cells[index] = cell;
        true
    }

    pub fn cell(&self, ring_track: u16, ring_scene: u16) -> Option<CellState> {
        self.geometry
            .index(ring_track, ring_scene)
            .map(|index| self.cells[index])
    }

    /// Re-read every pad from the host. Cells outside the session are empty.
    pub fn reload<S: StateSource + ?Sized>(&mut self, window: &RingWindow, source: &S) {
        for ring_track in 0..self.geometry.rows {
            for ring_scene in 0..self.geometry.columns {
                let track = window.track_offset.saturating_add(ring_track);
                let scene = window.scene_offset.saturating_add(ring_scene);
                let cell = if window.contains(track, scene) {
                    source.cell(CellKey::new(track, scene))
                } else {
                    CellState::EMPTY
                };
                self.set_cell(ring_track, ring_scene, cell);
            }
        }
    }

    pub fn colors(&self) -> Vec<Rgb> {
        self.cells.iter().map(|cell| shade(*cell)).collect()
    }

    /// Full-grid payload for `NEOTRELLIS_CLIP_GRID`.
    pub fn render(&self) -> Bytes {
        render_colors(&self.colors())
    }
}
