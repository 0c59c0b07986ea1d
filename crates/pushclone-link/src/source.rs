//! Boundary to the host's session state.
//!
//! The link never holds callbacks into the host. A [`StateSource`] answers
//! point queries and tracks subscriptions; when a subscribed cell changes,
//! the host adapter calls [`Link::on_state_change`] with the cell's key.
//!
//! [`Link::on_state_change`]: crate::Link::on_state_change

use std::collections::{BTreeMap, HashMap};

use pushclone_frame::Rgb;
use serde::{Deserialize, Serialize};

/// Absolute position of a clip slot in the host session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub track: u16,
    pub scene: u16,
}

impl CellKey {
    pub const fn new(track: u16, scene: u16) -> Self {
        Self { track, scene }
    }
}

/// Playback state of a clip slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipState {
    /// No clip in the slot.
    #[default]
    Empty,
    /// A clip is present but not playing.
    Stopped,
    Playing,
    /// Triggered, waiting for the launch quantization boundary.
    Queued,
    Recording,
}

/// What the host reports for one clip slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellState {
    pub state: ClipState,
    /// Clip colour. Ignored when the slot is empty.
    #[serde(default)]
    pub color: (u8, u8, u8),
}

impl CellState {
    pub const EMPTY: CellState = CellState {
        state: ClipState::Empty,
        color: (0, 0, 0),
    };

    pub fn new(state: ClipState, color: Rgb) -> Self {
        Self {
            state,
            color: (color.r, color.g, color.b),
        }
    }

    pub fn has_clip(&self) -> bool {
        self.state != ClipState::Empty
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::from(self.color)
    }
}

/// Opaque token returned by [`StateSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionHandle(pub u64);

/// Capability the link needs from the host's object model.
pub trait StateSource {
    /// Current state of a cell. Cells outside the session read as empty.
    fn cell(&self, key: CellKey) -> CellState;

    /// Start reporting changes to `key` through `Link::on_state_change`.
    fn subscribe(&mut self, key: CellKey) -> SubscriptionHandle;

    /// Stop reporting changes for a previously returned handle.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);

    /// Session size as `(tracks, scenes)`.
    fn totals(&self) -> (u16, u16);
}

/// In-memory session, for tests and the CLI simulator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySource {
    tracks: u16,
    scenes: u16,
    #[serde(default)]
    cells: BTreeMap<u16, BTreeMap<u16, CellState>>,
    #[serde(skip)]
    subscriptions: HashMap<SubscriptionHandle, CellKey>,
    #[serde(skip)]
    next_handle: u64,
}

impl MemorySource {
    pub fn new(tracks: u16, scenes: u16) -> Self {
        Self {
            tracks,
            scenes,
            ..Self::default()
        }
    }

    /// Set a cell. Returns `true` if the cell is subscribed, meaning the
    /// caller should forward the change to the link.
    pub fn set_cell(&mut self, key: CellKey, state: CellState) -> bool {
        if state == CellState::EMPTY {
            if let Some(row) = self.cells.get_mut(&key.track) {
                row.remove(&key.scene);
            }
        } else {
            self.cells
                .entry(key.track)
                .or_default()
                .insert(key.scene, state);
        }
        self.is_subscribed(key)
    }

    pub fn set_totals(&mut self, tracks: u16, scenes: u16) {
        self.tracks = tracks;
        self.scenes = scenes;
    }

    pub fn is_subscribed(&self, key: CellKey) -> bool {
        self.subscriptions.values().any(|k| *k == key)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Keys currently subscribed, sorted.
    pub fn subscribed_keys(&self) -> Vec<CellKey> {
        let mut keys: Vec<CellKey> = self.subscriptions.values().copied().collect();
        keys.sort_unstable();
        keys
    }
}

impl StateSource for MemorySource {
    fn cell(&self, key: CellKey) -> CellState {
        if key.track >= self.tracks || key.scene >= self.scenes {
            return CellState::EMPTY;
        }
        self.cells
            .get(&key.track)
            .and_then(|row| row.get(&key.scene))
            .copied()
            .unwrap_or(CellState::EMPTY)
    }

    fn subscribe(&mut self, key: CellKey) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscriptions.insert(handle, key);
        handle
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        self.subscriptions.remove(&handle);
    }

    fn totals(&self) -> (u16, u16) {
        (self.tracks, self.scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_default_to_empty() {
        let source = MemorySource::new(4, 4);
        assert_eq!(source.cell(CellKey::new(1, 1)), CellState::EMPTY);
        assert!(!source.cell(CellKey::new(1, 1)).has_clip());
    }

    #[test]
    fn set_and_read_cell() {
        let mut source = MemorySource::new(4, 4);
        let playing = CellState::new(ClipState::Playing, Rgb::new(10, 20, 30));
        source.set_cell(CellKey::new(2, 3), playing);
        assert_eq!(source.cell(CellKey::new(2, 3)), playing);

        source.set_cell(CellKey::new(2, 3), CellState::EMPTY);
        assert_eq!(source.cell(CellKey::new(2, 3)), CellState::EMPTY);
    }

    #[test]
    fn cells_outside_session_read_empty() {
        let mut source = MemorySource::new(2, 2);
        source.set_cell(
            CellKey::new(1, 1),
            CellState::new(ClipState::Stopped, Rgb::WHITE),
        );
        source.set_totals(1, 1);
        assert_eq!(source.cell(CellKey::new(1, 1)), CellState::EMPTY);
    }

    #[test]
    fn subscriptions_are_tracked() {
        let mut source = MemorySource::new(4, 4);
        let key = CellKey::new(0, 0);
        let handle = source.subscribe(key);

        assert!(source.set_cell(key, CellState::new(ClipState::Queued, Rgb::WHITE)));
        assert!(!source.set_cell(CellKey::new(1, 0), CellState::EMPTY));
        assert_eq!(source.subscribed_keys(), vec![key]);

        source.unsubscribe(handle);
        assert_eq!(source.subscription_count(), 0);
        assert!(!source.is_subscribed(key));
    }

    #[test]
    fn deserializes_session_document() {
        let json = r#"{
            "tracks": 8,
            "scenes": 16,
            "cells": { "3": { "5": { "state": "playing", "color": [255, 0, 128] } } }
        }"#;
        let source: MemorySource = serde_json::from_str(json).unwrap();
        assert_eq!(source.totals(), (8, 16));
        let cell = source.cell(CellKey::new(3, 5));
        assert_eq!(cell.state, ClipState::Playing);
        assert_eq!(cell.rgb(), Rgb::new(255, 0, 128));
    }
}
