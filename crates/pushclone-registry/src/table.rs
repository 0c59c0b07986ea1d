use pushclone_frame::command::*;

use crate::descriptor::Direction::{self, Bidirectional as BI, DeviceToHost as D2H, HostToDevice as H2D};
use crate::descriptor::PayloadShape::{self, Empty, Fixed, Variable};

/// The canonical command table.
pub(crate) const CANONICAL: &[(u8, Direction, PayloadShape)] = &[
    (SWITCH_VIEW, BI, Fixed(1)),
    // Clip / scene
    (CLIP_STATE, H2D, Fixed(9)),
    (CLIP_TRIGGER, D2H, Fixed(2)),
    (SCENE_FIRE, D2H, Fixed(1)),
    (CLIP_STOP, D2H, Fixed(2)),
    (CLIP_NAME, H2D, Variable),
    (CLIP_LOOP, H2D, Variable),
    (CLIP_MUTED, H2D, Variable),
    (CLIP_WARP, H2D, Variable),
    (CLIP_START, H2D, Variable),
    (CLIP_END, H2D, Variable),
    (SCENE_STATE, H2D, Variable),
    (SCENE_NAME, H2D, Variable),
    (SCENE_COLOR, H2D, Fixed(7)),
    (SCENE_IS_TRIGGERED, H2D, Fixed(2)),
    // Mixer / track
    (MIXER_STATE, H2D, Variable),
    (MIXER_VOLUME, BI, Fixed(2)),
    (MIXER_PAN, BI, Fixed(2)),
    (MIXER_MUTE, BI, Variable),
    (MIXER_SOLO, BI, Variable),
    (MIXER_ARM, BI, Variable),
    (MIXER_SEND, BI, Fixed(3)),
    (TRACK_NAME, H2D, Variable),
    (TRACK_PLAYING_SLOT, H2D, Fixed(2)),
    (TRACK_FIRED_SLOT, H2D, Fixed(2)),
    (TRACK_FOLD_STATE, H2D, Fixed(2)),
    (TRACK_COLOR, H2D, Fixed(7)),
    // Device
    (DEVICE_LIST, H2D, Variable),
    (DEVICE_SELECT, D2H, Fixed(2)),
    (DEVICE_PARAMS, H2D, Variable),
    (PARAM_CHANGE, BI, Variable),
    (PARAM_VALUE, H2D, Variable),
    (DEVICE_ENABLE, BI, Variable),
    (DEVICE_PREV_NEXT, D2H, Fixed(1)),
    (PARAM_PAGE, D2H, Fixed(1)),
    // Notes / pads / grid
    (NOTE_ON, D2H, Variable),
    (NOTE_OFF, D2H, Variable),
    (SCALE_CHANGE, D2H, Variable),
    (SCALE_INFO, H2D, Variable),
    (OCTAVE_CHANGE, D2H, Fixed(1)),
    (OCTAVE_INFO, H2D, Fixed(1)),
    (TRACK_INSTRUMENT, H2D, Variable),
    (DRUM_PAD_MAP, H2D, Variable),
    (DRUM_RACK_STATE, H2D, Variable),
    (DRUM_PAD_STATE, H2D, Variable),
    (DEVICE_CHAIN, H2D, Variable),
    (NEOTRELLIS_GRID, H2D, Variable),
    (DRUM_PAD_COLOR, H2D, Variable),
    (NEOTRELLIS_CLIP_GRID, H2D, Fixed(CLIP_GRID_PAYLOAD_LEN)),
    (GRID_SINGLE_PAD, H2D, Fixed(7)),
    // Transport
    (TRANSPORT, H2D, Fixed(3)),
    (TRANSPORT_PLAY, D2H, Empty),
    (TRANSPORT_RECORD, BI, Variable),
    (TRANSPORT_LOOP, BI, Variable),
    (TRANSPORT_TEMPO, H2D, Variable),
    (TRANSPORT_SIGNATURE, H2D, Variable),
    (TRANSPORT_POSITION, H2D, Variable),
    (TRANSPORT_METRONOME, BI, Variable),
    (TRANSPORT_OVERDUB, BI, Variable),
    (TRANSPORT_PUNCH, BI, Variable),
    (TRANSPORT_QUANTIZE, BI, Variable),
    (SESSION_RECORD, BI, Variable),
    // Connection
    (HANDSHAKE, BI, Fixed(2)),
    (HANDSHAKE_REPLY, BI, Fixed(2)),
    (VIEW_STATE, H2D, Variable),
    (PING_TEST, BI, Variable),
    (DISCONNECT, BI, Empty),
    // Session ring / navigation
    (RING_POSITION, H2D, Fixed(6)),
    (RING_NAVIGATE, D2H, Fixed(1)),
    (RING_SELECT, D2H, Fixed(2)),
    (TRACK_SELECT, H2D, Fixed(2)),
    (SCENE_SELECT, H2D, Fixed(2)),
    (SESSION_OVERVIEW, H2D, Fixed(9)),
    (OVERVIEW_TOGGLE, D2H, Empty),
    (OVERVIEW_ZOOM, D2H, Empty),
    // Browser / selection
    (SELECTED_TRACK, H2D, Variable),
    (SELECTED_SCENE, H2D, Variable),
    (DETAIL_CLIP, H2D, Variable),
    (BROWSER_MODE, H2D, Variable),
    // Automation / editing
    (AUTOMATION_RECORD, BI, Variable),
    (RE_ENABLE_AUTOMATION, D2H, Empty),
    (BACK_TO_ARRANGER, D2H, Empty),
    (UNDO, D2H, Empty),
    (REDO, D2H, Empty),
    (CAPTURE_MIDI, D2H, Empty),
    (QUANTIZE_CLIP, D2H, Empty),
    (QUANTIZE_NOTES, D2H, Empty),
];
