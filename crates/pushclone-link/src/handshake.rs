//! Connection lifecycle for the controller link.
//!
//! Action-based: methods take the current time and return the frames to
//! send plus whether a full state dump is due. The caller owns all I/O.
//!
//! ```text
//!              open()                    peer HANDSHAKE / any valid frame
//! ┌──────────────┐ ─────> ┌───────────────┐ ───────────────> ┌───────────┐
//! │ Disconnected │        │ AwaitingReply │                  │ Connected │
//! └──────────────┘ <───── └───────────────┘                  └───────────┘
//!    ^   │ retry   retry tick                                       │
//!    │   └─ resend HANDSHAKE every interval                         │
//!    └──────────────────── disconnect() / peer DISCONNECT ──────────┘
//! ```
//!
//! There is no liveness timeout: once connected, the link stays connected
//! until an explicit teardown.

use std::time::{Duration, Instant};

use bytes::Bytes;
use pushclone_frame::command::{DISCONNECT, HANDSHAKE, HANDSHAKE_REPLY};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LinkError, Result};

const TAG_LEN: usize = 2;

/// Connection state of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    AwaitingReply,
    Connected,
}

/// What the caller must do after a handshake transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this frame immediately, outside the coalescer.
    Send { command: u8, payload: Bytes },
    /// Queue and force-flush the complete visible state.
    StateDump,
}

/// Handshake tags and retry cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// Fixed interval between handshake attempts while not connected.
    pub retry_interval_ms: u64,
    /// Two ASCII characters identifying this side in `HANDSHAKE`.
    pub local_tag: String,
    /// Two ASCII characters sent back in `HANDSHAKE_REPLY`.
    pub reply_tag: String,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            retry_interval_ms: 1000,
            local_tag: "PC".to_string(),
            reply_tag: "LV".to_string(),
        }
    }
}

impl HandshakeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.retry_interval_ms == 0 {
            return Err(LinkError::Config(
                "handshake retry interval must be non-zero".to_string(),
            ));
        }
        validate_tag("local_tag", &self.local_tag)?;
        validate_tag("reply_tag", &self.reply_tag)?;
        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

fn validate_tag(field: &str, tag: &str) -> Result<()> {
    if tag.len() != TAG_LEN || !tag.bytes().all(|b| b.is_ascii() && !b.is_ascii_control()) {
        return Err(LinkError::Config(format!(
            "{field} must be exactly {TAG_LEN} printable ASCII characters, got {tag:?}"
        )));
    }
    Ok(())
}

/// The handshake state machine.
#[derive(Debug, Clone)]
pub struct Handshake {
    state: ConnectionState,
    local_tag: Bytes,
    reply_tag: Bytes,
    retry_interval: Duration,
    next_retry: Option<Instant>,
}

impl Handshake {
    /// Create a state machine in `Disconnected`. Nothing is sent until
    /// [`open`](Handshake::open).
    pub fn new(config: &HandshakeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: ConnectionState::Disconnected,
            local_tag: Bytes::copy_from_slice(config.local_tag.as_bytes()),
            reply_tag: Bytes::copy_from_slice(config.reply_tag.as_bytes()),
            retry_interval: config.retry_interval(),
            next_retry: None,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// When the next retry is due. `None` once connected.
    pub fn next_retry(&self) -> Option<Instant> {
        self.next_retry
    }

    /// Send the first handshake and wait for the peer.
    pub fn open(&mut self, now: Instant) -> Vec<HandshakeAction> {
        if self.is_connected() {
            return Vec::new();
        }
        self.state = ConnectionState::AwaitingReply;
        self.next_retry = Some(now + self.retry_interval);
        debug!("handshake sent, awaiting reply");
        vec![self.handshake_frame()]
    }

    /// Timer tick. Resends the handshake when a retry is due.
    pub fn tick(&mut self, now: Instant) -> Vec<HandshakeAction> {
        match self.next_retry {
            Some(due) if !self.is_connected() && now >= due => {
                if self.state == ConnectionState::AwaitingReply {
                    debug!("no handshake reply, retrying");
                }
                self.state = ConnectionState::Disconnected;
                self.next_retry = Some(now + self.retry_interval);
                vec![self.handshake_frame()]
            }
            _ => Vec::new(),
        }
    }

    /// Feed a validated inbound command.
    pub fn on_frame(&mut self, command: u8, now: Instant) -> Vec<HandshakeAction> {
        match command {
            HANDSHAKE => {
                if self.is_connected() {
                    info!("peer handshake while connected, resending state");
                } else {
                    self.connect("peer handshake");
                }
                vec![
                    HandshakeAction::Send {
                        command: HANDSHAKE_REPLY,
                        payload: self.reply_tag.clone(),
                    },
                    HandshakeAction::StateDump,
                ]
            }
            DISCONNECT => {
                if self.is_connected() {
                    info!("peer disconnected");
                    self.state = ConnectionState::Disconnected;
                    self.next_retry = Some(now + self.retry_interval);
                }
                Vec::new()
            }
            _ if !self.is_connected() => {
                self.connect("valid traffic from peer");
                vec![HandshakeAction::StateDump]
            }
            _ => Vec::new(),
        }
    }

    /// Explicit teardown. Sends `DISCONNECT` best-effort if connected.
    pub fn disconnect(&mut self, now: Instant) -> Vec<HandshakeAction> {
        let was_connected = self.is_connected();
        self.state = ConnectionState::Disconnected;
        self.next_retry = Some(now + self.retry_interval);
        if was_connected {
            info!("link disconnected");
            vec![HandshakeAction::Send {
                command: DISCONNECT,
                payload: Bytes::new(),
            }]
        } else {
            Vec::new()
        }
    }

    fn connect(&mut self, reason: &str) {
        info!(reason, "link connected");
        self.state = ConnectionState::Connected;
        self.next_retry = None;
    }

    fn handshake_frame(&self) -> HandshakeAction {
        HandshakeAction::Send {
            command: HANDSHAKE,
            payload: self.local_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pushclone_frame::command::{MIXER_VOLUME, PING_TEST};

    use super::*;

    fn machine() -> Handshake {
        Handshake::new(&HandshakeConfig::default()).unwrap()
    }

    fn sends(actions: &[HandshakeAction]) -> Vec<(u8, Vec<u8>)> {
        actions
            .iter()
            .filter_map(|a| match a {
                HandshakeAction::Send { command, payload } => Some((*command, payload.to_vec())),
                HandshakeAction::StateDump => None,
            })
            .collect()
    }

    fn dumps(actions: &[HandshakeAction]) -> usize {
        actions
            .iter()
            .filter(|a| matches!(a, HandshakeAction::StateDump))
            .count()
    }

    #[test]
    fn open_sends_handshake_and_awaits() {
        let mut hs = machine();
        let now = Instant::now();
        assert_eq!(hs.state(), ConnectionState::Disconnected);

        let actions = hs.open(now);
        assert_eq!(sends(&actions), vec![(HANDSHAKE, b"PC".to_vec())]);
        assert_eq!(hs.state(), ConnectionState::AwaitingReply);
        assert_eq!(hs.next_retry(), Some(now + Duration::from_secs(1)));
    }

    #[test]
    fn retry_fires_at_fixed_interval() {
        let mut hs = machine();
        let t0 = Instant::now();
        hs.open(t0);

        assert!(hs.tick(t0 + Duration::from_millis(999)).is_empty());

        let actions = hs.tick(t0 + Duration::from_millis(1000));
        assert_eq!(sends(&actions), vec![(HANDSHAKE, b"PC".to_vec())]);
        assert_eq!(hs.state(), ConnectionState::Disconnected);

        let t1 = t0 + Duration::from_millis(1000);
        assert!(hs.tick(t1 + Duration::from_millis(500)).is_empty());
        assert_eq!(sends(&hs.tick(t1 + Duration::from_millis(1000))).len(), 1);
        assert_eq!(hs.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn peer_handshake_replies_and_dumps() {
        let mut hs = machine();
        let now = Instant::now();
        hs.open(now);

        let actions = hs.on_frame(HANDSHAKE, now);
        assert_eq!(sends(&actions), vec![(HANDSHAKE_REPLY, b"LV".to_vec())]);
        assert_eq!(dumps(&actions), 1);
        assert_eq!(hs.state(), ConnectionState::Connected);
        assert_eq!(hs.next_retry(), None);
    }

    #[test]
    fn peer_handshake_from_disconnected() {
        let mut hs = machine();
        let actions = hs.on_frame(HANDSHAKE, Instant::now());
        assert_eq!(dumps(&actions), 1);
        assert!(hs.is_connected());
    }

    #[test]
    fn any_valid_frame_connects() {
        let mut hs = machine();
        let now = Instant::now();
        hs.open(now);

        let actions = hs.on_frame(PING_TEST, now);
        assert!(sends(&actions).is_empty());
        assert_eq!(dumps(&actions), 1);
        assert!(hs.is_connected());

        assert!(hs.on_frame(MIXER_VOLUME, now).is_empty());
    }

    #[test]
    fn handshake_reply_counts_as_proof_of_life() {
        let mut hs = machine();
        let actions = hs.on_frame(HANDSHAKE_REPLY, Instant::now());
        assert_eq!(dumps(&actions), 1);
        assert!(hs.is_connected());
    }

    #[test]
    fn rehandshake_while_connected_dumps_again() {
        let mut hs = machine();
        let now = Instant::now();
        hs.on_frame(HANDSHAKE, now);

        let actions = hs.on_frame(HANDSHAKE, now);
        assert_eq!(sends(&actions), vec![(HANDSHAKE_REPLY, b"LV".to_vec())]);
        assert_eq!(dumps(&actions), 1);
        assert!(hs.is_connected());
    }

    #[test]
    fn no_retry_once_connected() {
        let mut hs = machine();
        let t0 = Instant::now();
        hs.open(t0);
        hs.on_frame(HANDSHAKE, t0);

        assert!(hs.tick(t0 + Duration::from_secs(60)).is_empty());
        assert!(hs.is_connected());
    }

    #[test]
    fn disconnect_sends_frame_and_rearms_retry() {
        let mut hs = machine();
        let t0 = Instant::now();
        hs.on_frame(HANDSHAKE, t0);

        let actions = hs.disconnect(t0);
        assert_eq!(sends(&actions), vec![(DISCONNECT, Vec::new())]);
        assert_eq!(hs.state(), ConnectionState::Disconnected);
        assert_eq!(sends(&hs.tick(t0 + Duration::from_secs(1))).len(), 1);
    }

    #[test]
    fn disconnect_when_not_connected_sends_nothing() {
        let mut hs = machine();
        assert!(hs.disconnect(Instant::now()).is_empty());
    }

    #[test]
    fn peer_disconnect_drops_to_disconnected() {
        let mut hs = machine();
        let now = Instant::now();
        hs.on_frame(HANDSHAKE, now);

        assert!(hs.on_frame(DISCONNECT, now).is_empty());
        assert_eq!(hs.state(), ConnectionState::Disconnected);

        assert!(hs.on_frame(DISCONNECT, now).is_empty());
        assert_eq!(hs.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn config_validation() {
        assert!(HandshakeConfig::default().validate().is_ok());

        let bad_tag = HandshakeConfig {
            local_tag: "PCX".to_string(),
            ..HandshakeConfig::default()
        };
        assert!(matches!(bad_tag.validate(), Err(LinkError::Config(_))));

        let non_ascii = HandshakeConfig {
            reply_tag: "Lé".to_string(),
            ..HandshakeConfig::default()
        };
        assert!(Handshake::new(&non_ascii).is_err());

        let zero = HandshakeConfig {
            retry_interval_ms: 0,
            ..HandshakeConfig::default()
        };
        assert!(zero.validate().is_err());
    }
}
