//! Dialect B: community "sigroot" firmware.
//!
//! Opcodes are single ASCII mnemonic bytes with no prefix. Identification is
//! a fixed-length ASCII string, `"Sig FW LED Matrix FW V<major>.<minor>"`.
//!
//! Wire layouts:
//!
//! ```text
//! IDENT             7F
//! SET_CONST_SCALE   73 <scale>
//! DRAW_PWM          6D <306 gamma-corrected bytes, row-major>
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    MODULE_HEIGHT, MODULE_WIDTH, PixelGrid, VersionInfo,
    errors::{ProtocolError, Result},
    gamma,
};

/// Length of the IDENT reply.
pub const IDENT_LEN: usize = 25;

/// Fixed part of the IDENT reply, ahead of the version token.
pub const IDENT_PREFIX: &str = "Sig FW LED Matrix FW";

/// Scale value sent once per session before the first draw.
pub const CONST_SCALE: u8 = 0x20;

/// Size of a DRAW_PWM payload: one byte per pixel.
pub const PWM_FRAME_SIZE: usize = MODULE_HEIGHT * MODULE_WIDTH;

/// Command opcodes (ASCII mnemonic in comments).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// No operation
    Noop = 0x00,
    /// 'A' startup animation, once
    AnimStartupOnce = 0x41,
    /// 'M' PWM draw, blocking until displayed
    DrawPwmBlocking = 0x4D,
    /// 'N' scale draw, blocking until displayed
    DrawScaleBlocking = 0x4E,
    /// 'a' startup animation
    AnimStartup = 0x61,
    /// 'b' fire animation
    AnimFire = 0x62,
    /// 'c' drop queued commands
    FlushCmdQueue = 0x63,
    /// 'd' diamond animation
    AnimDiamond = 0x64,
    /// 'e' reboot into the bootloader
    Bootloader = 0x65,
    /// 'f' fireplace animation
    AnimFireplace = 0x66,
    /// 'g' gear animation
    AnimGear = 0x67,
    /// 'm' PWM draw
    DrawPwm = 0x6D,
    /// 'n' scale draw
    DrawScale = 0x6E,
    /// 'p' set one pixel's PWM
    SetPxPwm = 0x70,
    /// 'q' set one pixel's scale
    SetPxScale = 0x71,
    /// 'r' ring animation
    AnimRing = 0x72,
    /// 's' set every pixel's scale
    SetConstScale = 0x73,
    /// 't' test pattern
    TestPattern = 0x74,
    /// 'w' set every pixel's PWM
    SetConstPwm = 0x77,
    /// Identify firmware
    Ident = 0x7F,
}

impl Command {
    /// Opcode byte.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse an opcode byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => Self::Noop,
            0x41 => Self::AnimStartupOnce,
            0x4D => Self::DrawPwmBlocking,
            0x4E => Self::DrawScaleBlocking,
            0x61 => Self::AnimStartup,
            0x62 => Self::AnimFire,
            0x63 => Self::FlushCmdQueue,
            0x64 => Self::AnimDiamond,
            0x65 => Self::Bootloader,
            0x66 => Self::AnimFireplace,
            0x67 => Self::AnimGear,
            0x6D => Self::DrawPwm,
            0x6E => Self::DrawScale,
            0x70 => Self::SetPxPwm,
            0x71 => Self::SetPxScale,
            0x72 => Self::AnimRing,
            0x73 => Self::SetConstScale,
            0x74 => Self::TestPattern,
            0x77 => Self::SetConstPwm,
            0x7F => Self::Ident,
            _ => return None,
        })
    }
}

fn frame(command: Command, params: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + params.len());
    buf.put_u8(command.to_u8());
    buf.put_slice(params);
    buf.freeze()
}

/// IDENT request.
#[must_use]
pub fn ident_request() -> Bytes {
    frame(Command::Ident, &[])
}

/// SET_CONST_SCALE with the given scale.
#[must_use]
pub fn set_const_scale(scale: u8) -> Bytes {
    frame(Command::SetConstScale, &[scale])
}

/// DRAW_PWM carrying every pixel, row-major, gamma-corrected.
///
/// # Errors
///
/// - `ProtocolError::GridDimensions` unless the grid is 34x9
pub fn pwm_draw(grid: &PixelGrid) -> Result<Bytes> {
    grid.ensure_dimensions(MODULE_HEIGHT, MODULE_WIDTH)?;

    let mut buf = BytesMut::with_capacity(1 + PWM_FRAME_SIZE);
    buf.put_u8(Command::DrawPwm.to_u8());
    for &value in grid.cells() {
        buf.put_u8(gamma(value));
    }
    Ok(buf.freeze())
}

/// Build the IDENT reply a device with this version sends.
#[must_use]
pub fn ident_reply(major: u16, minor: u16) -> String {
    format!("{IDENT_PREFIX} V{major}.{minor}")
}

/// Match an IDENT reply and extract the version.
///
/// The whole reply must be `Sig FW LED Matrix FW V<digits>.<digits>`, words
/// separated by exactly one whitespace character, nothing before or after.
/// Bytes are read as Latin-1.
///
/// # Errors
///
/// - `ProtocolError::IdentMismatch` if the reply does not match
pub fn parse_ident(reply: &[u8]) -> Result<VersionInfo> {
    let text: String = reply.iter().map(|&b| char::from(b)).collect();
    let mismatch = || ProtocolError::IdentMismatch(text.clone());

    let mut words = text.split(|c: char| c.is_ascii_whitespace());
    for expected in IDENT_PREFIX.split(' ') {
        if words.next() != Some(expected) {
            return Err(mismatch());
        }
    }

    let token = words.next().ok_or_else(mismatch)?;
    if words.next().is_some() {
        return Err(mismatch());
    }

    let (major, minor) =
        token.strip_prefix('V').and_then(|v| v.split_once('.')).ok_or_else(mismatch)?;

    Ok(VersionInfo {
        major: parse_digits(major).ok_or_else(mismatch)?,
        minor: parse_digits(minor).ok_or_else(mismatch)?,
        patch: None,
        pre_release: false,
    })
}

/// Whether `reply` identifies this dialect.
#[must_use]
pub fn is_ident_reply(reply: &[u8]) -> bool {
    parse_ident(reply).is_ok()
}

fn parse_digits(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
