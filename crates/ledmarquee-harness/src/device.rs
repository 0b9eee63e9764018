//! Emulated LED matrix modules.
//!
//! A [`FakeDevice`] runs as a task on the far end of an in-memory pipe and
//! parses the byte stream the way module firmware does: an opcode, then a
//! fixed number of parameter bytes. Every recognized command is recorded;
//! bytes the firmware does not understand are skipped one at a time, which
//! is how a module of one dialect reacts to a probe from the other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use ledmarquee_proto::{
    official::{self, VersionReply},
    sigroot,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, DuplexStream},
    sync::watch,
};

/// Size of the in-memory pipe buffer, in bytes.
const PIPE_CAPACITY: usize = 4096;

/// Firmware the emulated module runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeFirmware {
    /// Vendor firmware answering VERSION with the given fields.
    Official {
        /// Major version
        major: u8,
        /// Minor version (4 bits on the wire)
        minor: u8,
        /// Patch version (4 bits on the wire)
        patch: u8,
        /// Pre-release flag
        pre_release: bool,
    },
    /// Sigroot firmware answering IDENT with `V<major>.<minor>`.
    Sigroot {
        /// Major version
        major: u16,
        /// Minor version
        minor: u16,
    },
    /// Reads everything, answers nothing.
    Silent,
}

impl FakeFirmware {
    /// Release vendor firmware.
    pub fn official(major: u8, minor: u8, patch: u8) -> Self {
        Self::Official { major, minor, patch, pre_release: false }
    }

    /// Sigroot firmware.
    pub fn sigroot(major: u16, minor: u16) -> Self {
        Self::Sigroot { major, minor }
    }
}

/// One command as received by the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    /// Opcode byte.
    pub opcode: u8,
    /// Every byte of the command as sent, including any prefix.
    pub raw: Bytes,
}

#[derive(Default)]
struct Log {
    commands: Vec<DeviceCommand>,
    ignored: Vec<u8>,
}

/// Observer side of a running [`FakeDevice`].
#[derive(Clone)]
pub struct DeviceHandle {
    log: Arc<Mutex<Log>>,
    received: watch::Receiver<usize>,
}

impl DeviceHandle {
    /// Every command received so far, in arrival order.
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.lock().commands.clone()
    }

    /// Raw bytes of every received command with `opcode`.
    pub fn frames(&self, opcode: u8) -> Vec<Bytes> {
        self.lock()
            .commands
            .iter()
            .filter(|cmd| cmd.opcode == opcode)
            .map(|cmd| cmd.raw.clone())
            .collect()
    }

    /// Number of received commands with `opcode`.
    pub fn count(&self, opcode: u8) -> usize {
        self.lock().commands.iter().filter(|cmd| cmd.opcode == opcode).count()
    }

    /// Bytes skipped because they did not start a known command.
    pub fn ignored(&self) -> Vec<u8> {
        self.lock().ignored.clone()
    }

    /// Wait until at least `count` commands have been received.
    ///
    /// Returns early if the device stops (pipe closed).
    pub async fn wait_for(&self, count: usize) {
        let mut received = self.received.clone();
        let _ = received.wait_for(|&n| n >= count).await;
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Emulated module.
pub struct FakeDevice;

impl FakeDevice {
    /// Start a module running `firmware`.
    ///
    /// Returns the host end of the pipe, to be used as the session's
    /// transport, and a handle for inspecting what the module received. The
    /// module task ends when the host end is dropped.
    pub fn spawn(firmware: FakeFirmware) -> (DuplexStream, DeviceHandle) {
        let (host, device) = tokio::io::duplex(PIPE_CAPACITY);
        let log = Arc::new(Mutex::new(Log::default()));
        let (received_tx, received) = watch::channel(0);

        tokio::spawn(serve(device, firmware, Arc::clone(&log), received_tx));

        (host, DeviceHandle { log, received })
    }
}

async fn serve(
    mut stream: DuplexStream,
    firmware: FakeFirmware,
    log: Arc<Mutex<Log>>,
    received: watch::Sender<usize>,
) {
    loop {
        let step = match &firmware {
            FakeFirmware::Official { major, minor, patch, pre_release } => {
                let reply = VersionReply::new(*major, *minor, *patch, *pre_release).to_bytes();
                official_step(&mut stream, &reply).await
            },
            FakeFirmware::Sigroot { major, minor } => {
                let reply = sigroot::ident_reply(*major, *minor);
                sigroot_step(&mut stream, reply.as_bytes()).await
            },
            FakeFirmware::Silent => stream.read_u8().await.map(Step::Ignored),
        };

        let Ok(step) = step else {
            tracing::trace!("fake device pipe closed");
            return;
        };

        // Recorded before replying, so a host that has its reply also sees
        // the request in the log.
        let reply = {
            let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
            match step {
                Step::Command(command, reply) => {
                    log.commands.push(command);
                    received.send_replace(log.commands.len());
                    reply
                },
                Step::Ignored(byte) => {
                    log.ignored.push(byte);
                    None
                },
            }
        };

        if let Some(reply) = reply {
            if stream.write_all(&reply).await.is_err() || stream.flush().await.is_err() {
                return;
            }
        }
    }
}

enum Step {
    /// A recognized command and the reply it triggers.
    Command(DeviceCommand, Option<Bytes>),
    Ignored(u8),
}

async fn read_params(
    stream: &mut DuplexStream,
    head: &[u8],
    opcode: u8,
    len: usize,
) -> std::io::Result<DeviceCommand> {
    let mut raw = head.to_vec();
    let start = raw.len();
    raw.resize(start + len, 0);
    stream.read_exact(&mut raw[start..]).await?;
    Ok(DeviceCommand { opcode, raw: Bytes::from(raw) })
}

async fn official_step(stream: &mut DuplexStream, version_reply: &[u8]) -> std::io::Result<Step> {
    use official::Command;

    let first = stream.read_u8().await?;

    match Command::from_u8(first) {
        Some(Command::StageGreyCol) => {
            let command = read_params(stream, &[first], first, 1 + ledmarquee_proto::MODULE_HEIGHT)
                .await?;
            return Ok(Step::Command(command, None));
        },
        Some(Command::DrawGreyColBuffer) => {
            let command = DeviceCommand { opcode: first, raw: Bytes::from(vec![first]) };
            return Ok(Step::Command(command, None));
        },
        _ => {},
    }

    if first != official::VENDOR_PREFIX[0] {
        return Ok(Step::Ignored(first));
    }
    let second = stream.read_u8().await?;
    if second != official::VENDOR_PREFIX[1] {
        return Ok(Step::Ignored(first));
    }

    let opcode = stream.read_u8().await?;
    let head = [first, second, opcode];
    let params = match Command::from_u8(opcode) {
        Some(Command::Draw) => official::MONO_FRAME_SIZE,
        Some(
            Command::Brightness
            | Command::Pattern
            | Command::Sleep
            | Command::Animate
            | Command::StartGame
            | Command::GameCtrl,
        ) => 1,
        _ => 0,
    };
    let command = read_params(stream, &head, opcode, params).await?;

    let reply =
        (opcode == Command::Version.to_u8()).then(|| Bytes::copy_from_slice(version_reply));
    Ok(Step::Command(command, reply))
}

async fn sigroot_step(stream: &mut DuplexStream, ident: &[u8]) -> std::io::Result<Step> {
    use sigroot::Command;

    let opcode = stream.read_u8().await?;
    let params = match Command::from_u8(opcode) {
        Some(Command::Ident) => {
            let command = DeviceCommand { opcode, raw: Bytes::from(vec![opcode]) };
            return Ok(Step::Command(command, Some(Bytes::copy_from_slice(ident))));
        },
        Some(Command::DrawPwm | Command::DrawPwmBlocking) => sigroot::PWM_FRAME_SIZE,
        Some(Command::SetConstScale | Command::SetConstPwm) => 1,
        Some(Command::SetPxPwm | Command::SetPxScale) => 3,
        Some(Command::Noop) | None => return Ok(Step::Ignored(opcode)),
        Some(_) => 0,
    };
    let command = read_params(stream, &[opcode], opcode, params).await?;
    Ok(Step::Command(command, None))
}
