use std::io::{ErrorKind, Write};
use std::path::Path;

use bytes::BytesMut;
use pushclone_transport::{MidiPort, PortOptions};

use crate::codec::{encode_frame, Frame, FrameConfig, MIN_FRAME_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

/// Writes complete frames to any `Write` stream, stamping each with the
/// next 7-bit sequence number.
///
/// `WouldBlock` is not retried: on a non-blocking port the frame is
/// reported as failed and the caller decides whether to drop it.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    sequence: u8,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MIN_FRAME_SIZE + 192),
            config,
            sequence: 0,
        }
    }

    /// Encode and send a payload, returning the sequence number used.
    pub fn send(&mut self, command: u8, payload: &[u8]) -> Result<u8> {
        let sequence = self.sequence;
        self.sequence = (self.sequence + 1) & 0x7F;
        self.send_with_sequence(command, sequence, payload)?;
        Ok(sequence)
    }

    /// Write a frame exactly as given, keeping its sequence number.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send_with_sequence(frame.command, frame.sequence, &frame.payload)
    }

    fn send_with_sequence(&mut self, command: u8, sequence: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(command, sequence, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// The sequence number the next [`send`](FrameWriter::send) will use.
    pub fn next_sequence(&self) -> u8 {
        self.sequence
    }

    /// Override the next sequence number (masked to 7 bits).
    pub fn set_next_sequence(&mut self, sequence: u8) {
        self.sequence = sequence & 0x7F;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<MidiPort> {
    /// Open a MIDI port for non-blocking, best-effort writes.
    pub fn open_port(path: impl AsRef<Path>, config: FrameConfig) -> Result<Self> {
        let port =
            MidiPort::open_with(path, PortOptions::output()).map_err(transport_to_frame_error)?;
        Ok(Self::with_config(port, config))
    }
}
