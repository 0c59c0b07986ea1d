use std::fmt;

use serde::{Deserialize, Serialize};

/// Which way a command may travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HostToDevice,
    DeviceToHost,
    Bidirectional,
}

impl Direction {
    /// Whether a frame moving this way is allowed. `inbound` means device to host.
    pub fn allows(self, inbound: bool) -> bool {
        match self {
            Direction::Bidirectional => true,
            Direction::DeviceToHost => inbound,
            Direction::HostToDevice => !inbound,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::HostToDevice => "host_to_device",
            Direction::DeviceToHost => "device_to_host",
            Direction::Bidirectional => "bidirectional",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected payload length of a command.
///
/// In JSON: `"empty"`, `"variable"` or `{"fixed": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    Fixed(usize),
    Variable,
    Empty,
}

impl PayloadShape {
    pub fn accepts(self, len: usize) -> bool {
        match self {
            PayloadShape::Fixed(n) => len == n,
            PayloadShape::Variable => true,
            PayloadShape::Empty => len == 0,
        }
    }
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadShape::Fixed(n) => write!(f, "fixed({n})"),
            PayloadShape::Variable => f.write_str("variable"),
            PayloadShape::Empty => f.write_str("empty"),
        }
    }
}

/// One row of the command table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub id: u8,
    pub name: String,
    pub direction: Direction,
    pub shape: PayloadShape,
}

impl CommandDescriptor {
    pub fn new(id: u8, name: impl Into<String>, direction: Direction, shape: PayloadShape) -> Self {
        Self {
            id,
            name: name.into(),
            direction,
            shape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_allows() {
        assert!(Direction::DeviceToHost.allows(true));
        assert!(!Direction::DeviceToHost.allows(false));
        assert!(Direction::HostToDevice.allows(false));
        assert!(!Direction::HostToDevice.allows(true));
        assert!(Direction::Bidirectional.allows(true));
        assert!(Direction::Bidirectional.allows(false));
    }

    #[test]
    fn shape_accepts() {
        assert!(PayloadShape::Fixed(2).accepts(2));
        assert!(!PayloadShape::Fixed(2).accepts(3));
        assert!(PayloadShape::Empty.accepts(0));
        assert!(!PayloadShape::Empty.accepts(1));
        assert!(PayloadShape::Variable.accepts(0));
        assert!(PayloadShape::Variable.accepts(500));
    }

    #[test]
    fn descriptor_json_form() {
        let desc = CommandDescriptor::new(
            0x4D,
            "NEOTRELLIS_CLIP_GRID",
            Direction::HostToDevice,
            PayloadShape::Fixed(192),
        );
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["direction"], "host_to_device");
        assert_eq!(json["shape"]["fixed"], 192);

        let empty: PayloadShape = serde_json::from_str(r#""empty""#).unwrap();
        assert_eq!(empty, PayloadShape::Empty);
    }
}
