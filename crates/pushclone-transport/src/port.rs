use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};

/// How a [`MidiPort`] is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortOptions {
    /// Open for reading inbound bytes.
    pub read: bool,
    /// Open for writing outbound bytes.
    pub write: bool,
    /// Open with `O_NONBLOCK`. Writes that would block fail with
    /// `WouldBlock` instead of stalling the caller.
    pub nonblocking: bool,
}

impl Default for PortOptions {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
            nonblocking: false,
        }
    }
}

impl PortOptions {
    /// Blocking, read-only. Suits a dedicated listener loop.
    pub fn input() -> Self {
        Self {
            read: true,
            write: false,
            nonblocking: false,
        }
    }

    /// Non-blocking, write-only. Suits best-effort frame emission.
    pub fn output() -> Self {
        Self {
            read: false,
            write: true,
            nonblocking: true,
        }
    }
}

/// A raw MIDI byte stream backed by a device node, FIFO, or plain file.
pub struct MidiPort {
    file: File,
    path: PathBuf,
    options: PortOptions,
}

impl MidiPort {
    /// Open a port for reading and writing (blocking).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, PortOptions::default())
    }

    /// Open a port with explicit options.
    pub fn open_with(path: impl AsRef<Path>, options: PortOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut open = OpenOptions::new();
        open.read(options.read).write(options.write);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;

            let mut flags = libc::O_NOCTTY;
            if options.nonblocking {
                flags |= libc::O_NONBLOCK;
            }
            open.custom_flags(flags);
        }

        let file = open.open(&path).map_err(|source| TransportError::Open {
            path: path.clone(),
            source,
        })?;

        debug!(
            ?path,
            read = options.read,
            write = options.write,
            nonblocking = options.nonblocking,
            "opened MIDI port"
        );

        Ok(Self {
            file,
            path,
            options,
        })
    }

    /// The node this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the port was opened with.
    pub fn options(&self) -> PortOptions {
        self.options
    }

    /// Duplicate the underlying descriptor.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
            options: self.options,
        })
    }
}

impl Read for MidiPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if !self.options.read {
            return Err(std::io::Error::new(
                ErrorKind::Unsupported,
                "MIDI port not opened for reading",
            ));
        }
        self.file.read(buf)
    }
}

impl Write for MidiPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if !self.options.write {
            return Err(std::io::Error::new(
                ErrorKind::Unsupported,
                "MIDI port not opened for writing",
            ));
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl std::fmt::Debug for MidiPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidiPort")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pushclone-transport-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ))
    }

    #[test]
    fn write_then_read_back_through_file_node() {
        let path = temp_path("roundtrip");
        std::fs::write(&path, b"").unwrap();

        let mut out = MidiPort::open_with(&path, PortOptions::output()).unwrap();
        out.write_all(&[0xF0, 0x7F, 0x00, 0x7F, 0xF7]).unwrap();
        out.flush().unwrap();
        drop(out);

        let mut input = MidiPort::open_with(&path, PortOptions::input()).unwrap();
        let mut buf = Vec::new();
        input.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, vec![0xF0, 0x7F, 0x00, 0x7F, 0xF7]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_node_reports_open_error() {
        let path = temp_path("missing").join("nope");
        let err = MidiPort::open(&path).unwrap_err();
        match err {
            TransportError::Open { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn write_only_port_refuses_reads() {
        let path = temp_path("write-only");
        std::fs::write(&path, b"").unwrap();

        let mut port = MidiPort::open_with(&path, PortOptions::output()).unwrap();
        let mut buf = [0u8; 4];
        let err = port.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn clone_shares_options() {
        let path = temp_path("clone");
        std::fs::write(&path, b"").unwrap();

        let port = MidiPort::open(&path).unwrap();
        let cloned = port.try_clone().unwrap();
        assert_eq!(cloned.options(), PortOptions::default());
        assert_eq!(cloned.path(), path.as_path());

        let _ = std::fs::remove_file(&path);
    }
}
