//! Ports named on the command line.

use std::{
    io,
    path::{Path, PathBuf},
};

use ledmarquee_core::{PickError, PickedPort, PortInfo, PortPicker};

/// Opens a serial device node (or any pollable read/write file) by path.
///
/// Terminals are put in raw mode at 115200 baud; CDC-ACM modules ignore the
/// rate.
pub struct DevicePathPicker {
    path: PathBuf,
}

impl DevicePathPicker {
    /// Picker for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PortPicker for DevicePathPicker {
    async fn pick(&self) -> Result<PickedPort, PickError> {
        let port = open(&self.path).map_err(classify)?;
        Ok(PickedPort::new(port, PortInfo::labelled(self.path.display().to_string())))
    }
}

#[cfg(unix)]
fn open(path: &Path) -> io::Result<crate::tty::TtyPort> {
    crate::tty::TtyPort::open(path)
}

#[cfg(not(unix))]
fn open(_path: &Path) -> io::Result<tokio::io::DuplexStream> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "serial ports require a Unix host"))
}

fn classify(err: io::Error) -> PickError {
    match err.kind() {
        io::ErrorKind::ResourceBusy => PickError::Unavailable,
        _ => PickError::Io(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn busy_port_is_unavailable() {
        let err = io::Error::from(io::ErrorKind::ResourceBusy);
        assert_eq!(classify(err), PickError::Unavailable);
    }

    #[test]
    fn other_failures_are_io() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(classify(err), PickError::Io("denied".into()));
    }

    #[test]
    fn interrupted_open_is_io() {
        let err = io::Error::new(io::ErrorKind::Interrupted, "signal");
        assert_eq!(classify(err), PickError::Io("signal".into()));
    }

    #[tokio::test]
    async fn missing_path_fails() {
        let picker = DevicePathPicker::new("/nonexistent/ttyACM9");
        assert!(matches!(picker.pick().await, Err(PickError::Io(_))));
    }

    #[tokio::test]
    async fn regular_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let picker = DevicePathPicker::new(file.path());

        assert!(matches!(picker.pick().await, Err(PickError::Io(_))));
    }

    #[cfg(unix)]
    mod fifo {
        use std::time::Duration;

        use ledmarquee_core::PortOperations;

        use super::*;

        fn fifo(dir: &tempfile::TempDir) -> PathBuf {
            let path = dir.path().join("ttyFAKE0");
            nix::unistd::mkfifo(&path, nix::sys::stat::Mode::S_IRWXU).unwrap();
            path
        }

        #[tokio::test]
        async fn fifo_opens_with_label() {
            let dir = tempfile::tempdir().unwrap();
            let path = fifo(&dir);
            let picker = DevicePathPicker::new(&path);

            let picked = picker.pick().await.unwrap();

            assert_eq!(picked.info.label, path.display().to_string());
            assert_eq!(picked.info.vendor_id, None);
        }

        #[tokio::test]
        async fn write_after_timed_out_read_completes() {
            let dir = tempfile::tempdir().unwrap();
            let picked = DevicePathPicker::new(fifo(&dir)).pick().await.unwrap();
            let port = PortOperations::new(picked.transport, Duration::from_millis(100));

            assert!(port.rx(32).await.unwrap().is_empty());

            tokio::time::timeout(Duration::from_secs(2), port.tx(&[0x7f])).await.unwrap().unwrap();

            // The FIFO is open for both directions, so the byte loops back.
            assert_eq!(port.rx(1).await.unwrap(), vec![0x7f]);
        }
    }
}
