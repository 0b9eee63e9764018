//! Non-blocking serial device nodes.
//!
//! The fd is opened with `O_NONBLOCK` and registered with the reactor, so a
//! read dropped by a timeout leaves nothing pending and the port stays usable.

use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    os::unix::fs::OpenOptionsExt,
    path::Path,
    pin::Pin,
    task::{Context, Poll, ready},
};

use nix::{
    errno::Errno,
    fcntl::OFlag,
    sys::termios::{self, BaudRate, SetArg},
};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf, unix::AsyncFd};

/// Line rate for modules that honour it. CDC-ACM devices ignore it.
const BAUD: BaudRate = BaudRate::B115200;

/// A tty (or FIFO) driven through the tokio reactor.
pub struct TtyPort {
    fd: AsyncFd<File>,
}

impl TtyPort {
    /// Opens `path` read/write without making it the controlling terminal.
    ///
    /// Terminals are switched to raw mode. Other pollable files are used as
    /// they are; regular files fail registration with the reactor.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags((OFlag::O_NONBLOCK | OFlag::O_NOCTTY).bits())
            .open(path)?;

        make_raw(&file)?;

        Ok(Self { fd: AsyncFd::new(file)? })
    }
}

fn make_raw(file: &File) -> io::Result<()> {
    let mut attrs = match termios::tcgetattr(file) {
        Ok(attrs) => attrs,
        Err(Errno::ENOTTY | Errno::EINVAL) => return Ok(()),
        Err(errno) => return Err(errno.into()),
    };

    termios::cfmakeraw(&mut attrs);
    termios::cfsetspeed(&mut attrs, BAUD)?;
    termios::tcsetattr(file, SetArg::TCSANOW, &attrs)?;
    tracing::debug!("tty switched to raw mode");
    Ok(())
}

impl AsyncRead for TtyPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut guard = ready!(self.fd.poll_read_ready(cx))?;
            let unfilled = buf.initialize_unfilled();

            if let Ok(result) = guard.try_io(|inner| inner.get_ref().read(unfilled)) {
                return Poll::Ready(result.map(|n| buf.advance(n)));
            }
        }
    }
}

impl AsyncWrite for TtyPort {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = ready!(self.fd.poll_write_ready(cx))?;

            if let Ok(result) = guard.try_io(|inner| inner.get_ref().write(buf)) {
                return Poll::Ready(result);
            }
        }
    }

    // Writes go straight to the kernel; there is no user-space buffer.
    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
