//! Command identifiers.
//!
//! One canonical numbering. Direction and payload shape live in the
//! registry crate; this module only names the bytes.

/// Size of a full 32-pad grid frame: 32 pads × 6 colour bytes.
pub const CLIP_GRID_PAYLOAD_LEN: usize = 192;

// View
pub const SWITCH_VIEW: u8 = 0x01;

// Clip / scene
pub const CLIP_STATE: u8 = 0x10;
pub const CLIP_TRIGGER: u8 = 0x11;
pub const SCENE_FIRE: u8 = 0x12;
pub const CLIP_STOP: u8 = 0x13;
pub const CLIP_NAME: u8 = 0x14;
pub const CLIP_LOOP: u8 = 0x15;
pub const CLIP_MUTED: u8 = 0x16;
pub const CLIP_WARP: u8 = 0x17;
pub const CLIP_START: u8 = 0x18;
pub const CLIP_END: u8 = 0x19;
pub const SCENE_STATE: u8 = 0x1A;
pub const SCENE_NAME: u8 = 0x1B;
pub const SCENE_COLOR: u8 = 0x1C;
pub const SCENE_IS_TRIGGERED: u8 = 0x1D;

// Mixer / track
pub const MIXER_STATE: u8 = 0x20;
pub const MIXER_VOLUME: u8 = 0x21;
pub const MIXER_PAN: u8 = 0x22;
pub const MIXER_MUTE: u8 = 0x23;
pub const MIXER_SOLO: u8 = 0x24;
pub const MIXER_ARM: u8 = 0x25;
pub const MIXER_SEND: u8 = 0x26;
pub const TRACK_NAME: u8 = 0x27;
pub const TRACK_PLAYING_SLOT: u8 = 0x28;
pub const TRACK_FIRED_SLOT: u8 = 0x29;
pub const TRACK_FOLD_STATE: u8 = 0x2A;
pub const TRACK_COLOR: u8 = 0x2B;

// Device
pub const DEVICE_LIST: u8 = 0x30;
pub const DEVICE_SELECT: u8 = 0x31;
pub const DEVICE_PARAMS: u8 = 0x32;
pub const PARAM_CHANGE: u8 = 0x33;
pub const PARAM_VALUE: u8 = 0x34;
pub const DEVICE_ENABLE: u8 = 0x35;
pub const DEVICE_PREV_NEXT: u8 = 0x36;
pub const PARAM_PAGE: u8 = 0x37;

// Notes / pads / grid
pub const NOTE_ON: u8 = 0x40;
pub const NOTE_OFF: u8 = 0x41;
pub const SCALE_CHANGE: u8 = 0x42;
pub const SCALE_INFO: u8 = 0x43;
pub const OCTAVE_CHANGE: u8 = 0x44;
pub const OCTAVE_INFO: u8 = 0x45;
pub const TRACK_INSTRUMENT: u8 = 0x46;
pub const DRUM_PAD_MAP: u8 = 0x47;
pub const DRUM_RACK_STATE: u8 = 0x48;
pub const DRUM_PAD_STATE: u8 = 0x49;
pub const DEVICE_CHAIN: u8 = 0x4A;
pub const NEOTRELLIS_GRID: u8 = 0x4B;
pub const DRUM_PAD_COLOR: u8 = 0x4C;
pub const NEOTRELLIS_CLIP_GRID: u8 = 0x4D;
pub const GRID_SINGLE_PAD: u8 = 0x4E;

// Transport
pub const TRANSPORT: u8 = 0x50;
pub const TRANSPORT_PLAY: u8 = 0x51;
pub const TRANSPORT_RECORD: u8 = 0x52;
pub const TRANSPORT_LOOP: u8 = 0x53;
pub const TRANSPORT_TEMPO: u8 = 0x54;
pub const TRANSPORT_SIGNATURE: u8 = 0x55;
pub const TRANSPORT_POSITION: u8 = 0x56;
pub const TRANSPORT_METRONOME: u8 = 0x57;
pub const TRANSPORT_OVERDUB: u8 = 0x58;
pub const TRANSPORT_PUNCH: u8 = 0x59;
pub const TRANSPORT_QUANTIZE: u8 = 0x5A;
pub const SESSION_RECORD: u8 = 0x5B;

// Connection
pub const HANDSHAKE: u8 = 0x60;
pub const HANDSHAKE_REPLY: u8 = 0x61;
pub const VIEW_STATE: u8 = 0x62;
pub const PING_TEST: u8 = 0x63;
pub const DISCONNECT: u8 = 0x64;

// Session ring / navigation
pub const RING_POSITION: u8 = 0x70;
pub const RING_NAVIGATE: u8 = 0x71;
pub const RING_SELECT: u8 = 0x72;
pub const TRACK_SELECT: u8 = 0x73;
pub const SCENE_SELECT: u8 = 0x74;
pub const SESSION_OVERVIEW: u8 = 0x75;
pub const OVERVIEW_TOGGLE: u8 = 0x76;
pub const OVERVIEW_ZOOM: u8 = 0x77;

// Browser / selection
pub const SELECTED_TRACK: u8 = 0xB0;
pub const SELECTED_SCENE: u8 = 0xB1;
pub const DETAIL_CLIP: u8 = 0xB2;
pub const BROWSER_MODE: u8 = 0xB3;

// Automation / editing
pub const AUTOMATION_RECORD: u8 = 0xC0;
pub const RE_ENABLE_AUTOMATION: u8 = 0xC1;
pub const BACK_TO_ARRANGER: u8 = 0xC2;
pub const UNDO: u8 = 0xC3;
pub const REDO: u8 = 0xC4;
pub const CAPTURE_MIDI: u8 = 0xC5;
pub const QUANTIZE_CLIP: u8 = 0xC6;
pub const QUANTIZE_NOTES: u8 = 0xC7;

/// Human-readable name for a command byte, for logs and tooling.
pub fn command_name(command: u8) -> Option<&'static str> {
    let name = match command {
        SWITCH_VIEW => "SWITCH_VIEW",
        CLIP_STATE => "CLIP_STATE",
        CLIP_TRIGGER => "CLIP_TRIGGER",
        SCENE_FIRE => "SCENE_FIRE",
        CLIP_STOP => "CLIP_STOP",
        CLIP_NAME => "CLIP_NAME",
        CLIP_LOOP => "CLIP_LOOP",
        CLIP_MUTED => "CLIP_MUTED",
        CLIP_WARP => "CLIP_WARP",
        CLIP_START => "CLIP_START",
        CLIP_END => "CLIP_END",
        SCENE_STATE => "SCENE_STATE",
        SCENE_NAME => "SCENE_NAME",
        SCENE_COLOR => "SCENE_COLOR",
        SCENE_IS_TRIGGERED => "SCENE_IS_TRIGGERED",
        MIXER_STATE => "MIXER_STATE",
        MIXER_VOLUME => "MIXER_VOLUME",
        MIXER_PAN => "MIXER_PAN",
        MIXER_MUTE => "MIXER_MUTE",
        MIXER_SOLO => "MIXER_SOLO",
        MIXER_ARM => "MIXER_ARM",
        MIXER_SEND => "MIXER_SEND",
        TRACK_NAME => "TRACK_NAME",
        TRACK_PLAYING_SLOT => "TRACK_PLAYING_SLOT",
        TRACK_FIRED_SLOT => "TRACK_FIRED_SLOT",
        TRACK_FOLD_STATE => "TRACK_FOLD_STATE",
        TRACK_COLOR => "TRACK_COLOR",
        DEVICE_LIST => "DEVICE_LIST",
        DEVICE_SELECT => "DEVICE_SELECT",
        DEVICE_PARAMS => "DEVICE_PARAMS",
        PARAM_CHANGE => "PARAM_CHANGE",
        PARAM_VALUE => "PARAM_VALUE",
        DEVICE_ENABLE => "DEVICE_ENABLE",
        DEVICE_PREV_NEXT => "DEVICE_PREV_NEXT",
        PARAM_PAGE => "PARAM_PAGE",
        NOTE_ON => "NOTE_ON",
        NOTE_OFF => "NOTE_OFF",
        SCALE_CHANGE => "SCALE_CHANGE",
        SCALE_INFO => "SCALE_INFO",
        OCTAVE_CHANGE => "OCTAVE_CHANGE",
        OCTAVE_INFO => "OCTAVE_INFO",
        TRACK_INSTRUMENT => "TRACK_INSTRUMENT",
        DRUM_PAD_MAP => "DRUM_PAD_MAP",
        DRUM_RACK_STATE => "DRUM_RACK_STATE",
        DRUM_PAD_STATE => "DRUM_PAD_STATE",
        DEVICE_CHAIN => "DEVICE_CHAIN",
        NEOTRELLIS_GRID => "NEOTRELLIS_GRID",
        DRUM_PAD_COLOR => "DRUM_PAD_COLOR",
        NEOTRELLIS_CLIP_GRID => "NEOTRELLIS_CLIP_GRID",
        GRID_SINGLE_PAD => "GRID_SINGLE_PAD",
        TRANSPORT => "TRANSPORT",
        TRANSPORT_PLAY => "TRANSPORT_PLAY",
        TRANSPORT_RECORD => "TRANSPORT_RECORD",
        TRANSPORT_LOOP => "TRANSPORT_LOOP",
        TRANSPORT_TEMPO => "TRANSPORT_TEMPO",
        TRANSPORT_SIGNATURE => "TRANSPORT_SIGNATURE",
        TRANSPORT_POSITION => "TRANSPORT_POSITION",
        TRANSPORT_METRONOME => "TRANSPORT_METRONOME",
        TRANSPORT_OVERDUB => "TRANSPORT_OVERDUB",
        TRANSPORT_PUNCH => "TRANSPORT_PUNCH",
        TRANSPORT_QUANTIZE => "TRANSPORT_QUANTIZE",
        SESSION_RECORD => "SESSION_RECORD",
        HANDSHAKE => "HANDSHAKE",
        HANDSHAKE_REPLY => "HANDSHAKE_REPLY",
        VIEW_STATE => "VIEW_STATE",
        PING_TEST => "PING_TEST",
        DISCONNECT => "DISCONNECT",
        RING_POSITION => "RING_POSITION",
        RING_NAVIGATE => "RING_NAVIGATE",
        RING_SELECT => "RING_SELECT",
        TRACK_SELECT => "TRACK_SELECT",
        SCENE_SELECT => "SCENE_SELECT",
        SESSION_OVERVIEW => "SESSION_OVERVIEW",
        OVERVIEW_TOGGLE => "OVERVIEW_TOGGLE",
        OVERVIEW_ZOOM => "OVERVIEW_ZOOM",
        SELECTED_TRACK => "SELECTED_TRACK",
        SELECTED_SCENE => "SELECTED_SCENE",
        DETAIL_CLIP => "DETAIL_CLIP",
        BROWSER_MODE => "BROWSER_MODE",
        AUTOMATION_RECORD => "AUTOMATION_RECORD",
        RE_ENABLE_AUTOMATION => "RE_ENABLE_AUTOMATION",
        BACK_TO_ARRANGER => "BACK_TO_ARRANGER",
        UNDO => "UNDO",
        REDO => "REDO",
        CAPTURE_MIDI => "CAPTURE_MIDI",
        QUANTIZE_CLIP => "QUANTIZE_CLIP",
        QUANTIZE_NOTES => "QUANTIZE_NOTES",
        _ => return None,
    };
    Some(name)
}
