use std::io::{ErrorKind, Read};
use std::path::Path;

use bytes::{Bytes, BytesMut};
use pushclone_transport::{MidiPort, PortOptions, TransportError};
use tracing::debug;

use crate::codec::{decode_frame, split_sysex, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 512;

/// Reads complete SysEx messages and frames from any `Read` stream.
///
/// The stream may interleave ordinary MIDI traffic; only SysEx messages
/// are surfaced. Handles partial reads internally.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    dropped: u64,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            dropped: 0,
        }
    }

    /// Read the next complete SysEx message, `F0` through `F7` (blocking).
    ///
    /// Overlong messages are discarded and counted. Returns
    /// `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Bytes> {
        let max_len = self.config.max_message_size();
        loop {
            match split_sysex(&mut self.buf, max_len) {
                Ok(Some(message)) => return Ok(message),
                Ok(None) => {}
                Err(err) => {
                    self.dropped += 1;
                    debug!(reason = err.kind(), "discarding SysEx message");
                    continue;
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next valid frame (blocking).
    ///
    /// Malformed messages are dropped silently (counted in [`dropped`]).
    ///
    /// [`dropped`]: FrameReader::dropped
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            let message = self.read_message()?;
            match decode_frame(&message) {
                Ok(frame) => return Ok(frame),
                Err(err) => {
                    self.dropped += 1;
                    debug!(reason = err.kind(), len = message.len(), "dropping malformed frame");
                }
            }
        }
    }

    /// Number of messages discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<MidiPort> {
    /// Open a MIDI port for blocking reads.
    pub fn open_port(path: impl AsRef<Path>, config: FrameConfig) -> Result<Self> {
        let port = MidiPort::open_with(path, PortOptions::input()).map_err(transport_to_frame_error)?;
        Ok(Self::with_config(port, config))
    }
}

pub(crate) fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) => FrameError::Io(io),
        TransportError::Open { source, .. } => FrameError::Io(source),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(frames: &[(u8, u8, &[u8])]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for (command, sequence, payload) in frames {
            encode_frame(*command, *sequence, payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_frame() {
        let bytes = wire(&[(0x60, 0, b"PC")]);
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.command, 0x60);
        assert_eq!(frame.payload.as_ref(), b"PC");
    }

    #[test]
    fn read_multiple_frames() {
        let bytes = wire(&[(0x60, 0, b"PC"), (0x61, 1, b"LV"), (0x64, 2, b"")]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!((f1.command, f1.sequence), (0x60, 0));
        assert_eq!((f2.command, f2.sequence), (0x61, 1));
        assert_eq!((f3.command, f3.sequence), (0x64, 2));
    }

    #[test]
    fn read_message_returns_raw_sysex() {
        let bytes = wire(&[(0x63, 4, &[0x01])]);
        let mut reader = FrameReader::new(Cursor::new(bytes.clone()));
        assert_eq!(reader.read_message().unwrap().as_ref(), bytes.as_slice());
    }

    #[test]
    fn interleaved_midi_is_skipped() {
        let mut bytes = vec![0x90, 0x3C, 0x64, 0xB0, 0x07, 0x7F];
        bytes.extend(wire(&[(0x20, 3, &[0x01, 0x40])]));
        bytes.extend([0x80, 0x3C, 0x00]);

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.command, 0x20);
        assert_eq!(frame.payload.as_ref(), [0x01, 0x40]);
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[(0x4E, 7, &[0, 1, 2, 3, 4, 5, 6])]),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.command, 0x4E);
        assert_eq!(frame.payload.len(), 7);
    }

    #[test]
    fn corrupted_frame_is_dropped_and_counted() {
        let mut bytes = wire(&[(0x20, 0, &[0x01, 0x02])]);
        bytes[8] ^= 0x04;
        bytes.extend(wire(&[(0x21, 1, &[0x03, 0x04])]));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.command, 0x21);
        assert_eq!(reader.dropped(), 1);
    }

    #[test]
    fn oversized_message_is_dropped() {
        let big = vec![0x11u8; 64];
        let bytes = wire(&[(0x4D, 0, &big), (0x60, 1, b"PC")]);
        let config = FrameConfig {
            max_payload_size: 16,
        };

        let mut reader = FrameReader::with_config(Cursor::new(bytes), config);
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.command, 0x60);
        assert_eq!(reader.dropped(), 1);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let bytes = wire(&[(0x60, 0, b"PC")]);
        let mut reader = FrameReader::new(Cursor::new(bytes[..7].to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn open_missing_port_maps_to_io() {
        let err = FrameReader::open_port("/nonexistent/pushclone-midi", FrameConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, FrameError::Io(_)));
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }
}
