//! Rate-capped, last-write-wins outgoing message buffer.
//!
//! Each `(command, key)` pair owns at most one pending slot. Queuing into
//! an occupied slot overwrites its payload, so a burst of updates between
//! two flushes always collapses into a single frame carrying the latest
//! value.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use pushclone_frame::command::{
    CLIP_STATE, DEVICE_PARAMS, NEOTRELLIS_CLIP_GRID, NEOTRELLIS_GRID, RING_POSITION,
    SESSION_OVERVIEW, TRANSPORT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

pub const DEFAULT_FLUSH_RATE_HZ: u32 = 60;
pub const MIN_FLUSH_RATE_HZ: u32 = 1;
pub const MAX_FLUSH_RATE_HZ: u32 = 120;

/// Flush order. Lower tiers go out first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical = 1,
    High = 2,
    Normal = 3,
    Low = 4,
}

impl Priority {
    /// Default tier for a command.
    pub fn for_command(command: u8) -> Self {
        match command {
            TRANSPORT => Priority::Critical,
            CLIP_STATE | DEVICE_PARAMS | RING_POSITION => Priority::High,
            NEOTRELLIS_GRID | NEOTRELLIS_CLIP_GRID | SESSION_OVERVIEW => Priority::Normal,
            _ => Priority::Low,
        }
    }
}

/// Coalescer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalescerConfig {
    /// Flush cap in flushes per second, clamped to 1..=120.
    pub max_rate_hz: u32,
    /// Skip payloads identical to the last one sent for the same slot.
    pub suppress_duplicates: bool,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            max_rate_hz: DEFAULT_FLUSH_RATE_HZ,
            suppress_duplicates: false,
        }
    }
}

/// Slot identity: a command plus a disambiguator such as a track index.
pub type SlotKey = (u8, u32);

/// A frame released by a flush, ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub command: u8,
    pub key: u32,
    pub payload: Bytes,
}

/// Running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescerStats {
    /// `queue` calls accepted.
    pub queued: u64,
    /// Queued payloads that overwrote a pending one.
    pub coalesced: u64,
    /// Frames released by flushes.
    pub sent: u64,
    /// Flushes skipped because the rate cap had not elapsed.
    pub deferred: u64,
    /// Payloads dropped as duplicates of what was last sent.
    pub suppressed: u64,
    /// Slots currently waiting.
    pub pending: usize,
}

#[derive(Debug, Clone)]
struct Slot {
    payload: Bytes,
    priority: Priority,
    order: u64,
}

#[derive(Debug)]
pub struct Coalescer {
    slots: HashMap<SlotKey, Slot>,
    last_sent: HashMap<SlotKey, Bytes>,
    next_order: u64,
    last_flush: Option<Instant>,
    rate_hz: u32,
    frame_time: Duration,
    suppress_duplicates: bool,
    stats: CoalescerStats,
}

impl Coalescer {
    pub fn new(config: CoalescerConfig) -> Self {
        let rate_hz = clamp_rate(config.max_rate_hz);
        Self {
            slots: HashMap::new(),
            last_sent: HashMap::new(),
            next_order: 0,
            last_flush: None,
            rate_hz,
            frame_time: frame_time(rate_hz),
            suppress_duplicates: config.suppress_duplicates,
            stats: CoalescerStats::default(),
        }
    }

    /// Upsert the slot for `(command, key)`.
    ///
    /// An overwrite keeps the slot's original position among equal
    /// priorities but adopts the new priority.
    pub fn queue(&mut self, command: u8, key: u32, payload: impl Into<Bytes>, priority: Priority) {
        let payload = payload.into();
        let slot_key = (command, key);

        if self.suppress_duplicates && self.last_sent.get(&slot_key) == Some(&payload) {
            // The device already shows this value; a pending older value
            // must not overwrite it.
            self.slots.remove(&slot_key);
            self.stats.suppressed += 1;
            trace!(command, key, "suppressed duplicate payload");
            return;
        }

        self.stats.queued += 1;
        match self.slots.get_mut(&slot_key) {
            Some(slot) => {
                slot.payload = payload;
                slot.priority = priority;
                self.stats.coalesced += 1;
            }
            None => {
                let order = self.next_order;
                self.next_order += 1;
                self.slots.insert(
                    slot_key,
                    Slot {
                        payload,
                        priority,
                        order,
                    },
                );
            }
        }
    }

    /// Queue with the command's default priority.
    pub fn queue_default(&mut self, command: u8, key: u32, payload: impl Into<Bytes>) {
        self.queue(command, key, payload, Priority::for_command(command));
    }

    /// Release every pending slot if the rate cap allows it.
    pub fn flush(&mut self, now: Instant) -> Vec<Outgoing> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        if let Some(last) = self.last_flush {
            if now.saturating_duration_since(last) < self.frame_time {
                self.stats.deferred += 1;
                return Vec::new();
            }
        }
        self.drain(now)
    }

    /// Release every pending slot now, ignoring the rate cap.
    pub fn force_flush(&mut self, now: Instant) -> Vec<Outgoing> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        self.drain(now)
    }

    fn drain(&mut self, now: Instant) -> Vec<Outgoing> {
        let mut pending: Vec<(SlotKey, Slot)> = self.slots.drain().collect();
        pending.sort_by_key(|(_, slot)| (slot.priority, slot.order));

        let out: Vec<Outgoing> = pending
            .into_iter()
            .map(|((command, key), slot)| {
                self.last_sent.insert((command, key), slot.payload.clone());
                Outgoing {
                    command,
                    key,
                    payload: slot.payload,
                }
            })
            .collect();

        self.stats.sent += out.len() as u64;
        self.last_flush = Some(now);
        debug!(frames = out.len(), "coalescer flushed");
        out
    }

    /// When the next rate-capped flush may release frames.
    pub fn next_flush_at(&self) -> Option<Instant> {
        if self.slots.is_empty() {
            return None;
        }
        Some(match self.last_flush {
            Some(last) => last + self.frame_time,
            None => Instant::now(),
        })
    }

    /// Set the flush cap, clamped to 1..=120 Hz.
    pub fn set_frame_rate(&mut self, hz: u32) {
        self.rate_hz = clamp_rate(hz);
        self.frame_time = frame_time(self.rate_hz);
        debug!(hz = self.rate_hz, "coalescer frame rate set");
    }

    pub fn frame_rate(&self) -> u32 {
        self.rate_hz
    }

    pub fn frame_time(&self) -> Duration {
        self.frame_time
    }

    pub fn is_pending(&self, command: u8, key: u32) -> bool {
        self.slots.contains_key(&(command, key))
    }

    pub fn pending_len(&self) -> usize {
        self.slots.len()
    }

    /// Forget what was last sent so the next payload for every slot goes out.
    pub fn clear_history(&mut self) {
        self.last_sent.clear();
    }

    /// Discard pending slots and send history.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.last_sent.clear();
    }

    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            pending: self.slots.len(),
            ..self.stats
        }
    }
}

impl Default for Coalescer {
    fn default() -> Self {
        Self::new(CoalescerConfig::default())
    }
}

fn clamp_rate(hz: u32) -> u32 {
    hz.clamp(MIN_FLUSH_RATE_HZ, MAX_FLUSH_RATE_HZ)
}

fn frame_time(hz: u32) -> Duration {
    Duration::from_secs(1) / hz
}
