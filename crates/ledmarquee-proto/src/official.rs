//! Dialect A: the module vendor's official firmware.
//!
//! Commands are a single opcode byte followed by parameters. Most commands are
//! preceded by the two byte vendor prefix; the greyscale column commands are
//! sent bare. Every reply is exactly [`REPLY_SIZE`] bytes, zero padded.
//!
//! Wire layouts:
//!
//! ```text
//! VERSION           32 AC 20
//! DRAW              32 AC 06 <39 bytes, 1 bit per pixel, LSB first>
//! STAGE_GREY_COL    07 <col> <34 gamma-corrected bytes>
//! DRAW_GREY_COL_BUF 08
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    MODULE_HEIGHT, MODULE_WIDTH, PixelGrid, VersionInfo,
    errors::{ProtocolError, Result},
    gamma,
};

/// Vendor identifier sent ahead of prefixed commands (USB VID 0x32AC).
pub const VENDOR_PREFIX: [u8; 2] = [0x32, 0xAC];

/// USB product identifier of the module.
pub const PRODUCT_ID: u16 = 0x0020;

/// Size of every reply in this dialect.
pub const REPLY_SIZE: usize = 32;

/// Packed size of a 1-bit frame: ceil(34 * 9 / 8).
pub const MONO_FRAME_SIZE: usize = (MODULE_HEIGHT * MODULE_WIDTH).div_ceil(8);

/// Command opcodes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Set global brightness
    Brightness = 0x00,
    /// Display a built-in [`Pattern`]
    Pattern = 0x01,
    /// Reboot into the bootloader
    Bootloader = 0x02,
    /// Enter or leave sleep
    Sleep = 0x03,
    /// Toggle scrolling animation
    Animate = 0x04,
    /// Trigger a firmware panic (diagnostics)
    Panic = 0x05,
    /// Draw a packed 1-bit frame
    Draw = 0x06,
    /// Stage one greyscale column
    StageGreyCol = 0x07,
    /// Commit all staged greyscale columns
    DrawGreyColBuffer = 0x08,
    /// Start a built-in game
    StartGame = 0x10,
    /// Send game input
    GameCtrl = 0x11,
    /// Query game status
    GameStatus = 0x12,
    /// Query firmware version
    Version = 0x20,
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
            0x00 => Self::Brightness,
            0x01 => Self::Pattern,
            0x02 => Self::Bootloader,
            0x03 => Self::Sleep,
            0x04 => Self::Animate,
            0x05 => Self::Panic,
            0x06 => Self::Draw,
            0x07 => Self::StageGreyCol,
            0x08 => Self::DrawGreyColBuffer,
            0x10 => Self::StartGame,
            0x11 => Self::GameCtrl,
            0x12 => Self::GameStatus,
            0x20 => Self::Version,
            _ => return None,
        })
    }
}

/// Built-in patterns, the parameter of [`Command::Pattern`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Percentage bar
    Percentage = 0x00,
    /// Vertical gradient
    Gradient = 0x01,
    /// Two opposing gradients
    DoubleGradient = 0x02,
    /// "LOTUS" written horizontally
    LotusHorizontal = 0x03,
    /// Zig-zag
    ZigZag = 0x04,
    /// Every LED at full brightness
    FullBrightness = 0x05,
    /// Panic screen
    Panic = 0x06,
    /// "LOTUS" written vertically
    LotusVertical = 0x07,
}

/// Draw path, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitDepth {
    /// One gamma-corrected byte per pixel, sent column by column
    Gray8,
    /// One bit per pixel, sent as a single frame
    #[default]
    Mono1,
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gray8 => f.write_str("8-bit Grayscale"),
            Self::Mono1 => f.write_str("1-bit Monochrome"),
        }
    }
}

/// Frame a command behind the vendor prefix.
#[must_use]
pub fn prefixed(command: Command, params: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(VENDOR_PREFIX.len() + 1 + params.len());
    buf.put_slice(&VENDOR_PREFIX);
    buf.put_u8(command.to_u8());
    buf.put_slice(params);
    buf.freeze()
}

/// Frame a command without the vendor prefix.
#[must_use]
pub fn bare(command: Command, params: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + params.len());
    buf.put_u8(command.to_u8());
    buf.put_slice(params);
    buf.freeze()
}

/// VERSION request.
#[must_use]
pub fn version_request() -> Bytes {
    prefixed(Command::Version, &[])
}

/// Pack a module grid into 1-bit frame bytes.
///
/// Bit `i = row * 9 + col` lands in byte `i / 8` at bit `i % 8` (LSB first).
/// Any intensity above zero is lit.
///
/// # Errors
///
/// - `ProtocolError::GridDimensions` unless the grid is 34x9
pub fn pack_mono(grid: &PixelGrid) -> Result<[u8; MONO_FRAME_SIZE]> {
    grid.ensure_dimensions(MODULE_HEIGHT, MODULE_WIDTH)?;

    let mut output = [0u8; MONO_FRAME_SIZE];
    for (index, &value) in grid.cells().iter().enumerate() {
        if value > 0.0 {
            output[index >> 3] |= 1 << (index % 8);
        }
    }
    Ok(output)
}

/// DRAW command carrying a packed 1-bit frame.
///
/// # Errors
///
/// - `ProtocolError::GridDimensions` unless the grid is 34x9
pub fn mono_draw(grid: &PixelGrid) -> Result<Bytes> {
    Ok(prefixed(Command::Draw, &pack_mono(grid)?))
}

/// Transpose a module grid to column-major order and gamma-correct it.
///
/// # Errors
///
/// - `ProtocolError::GridDimensions` unless the grid is 34x9
pub fn grey_columns(grid: &PixelGrid) -> Result<[[u8; MODULE_HEIGHT]; MODULE_WIDTH]> {
    grid.ensure_dimensions(MODULE_HEIGHT, MODULE_WIDTH)?;

    let mut cols = [[0u8; MODULE_HEIGHT]; MODULE_WIDTH];
    for (c, column) in cols.iter_mut().enumerate() {
        for (r, cell) in column.iter_mut().enumerate() {
            *cell = gamma(grid.value(r, c));
        }
    }
    Ok(cols)
}

/// STAGE_GREY_COL for one column.
#[must_use]
pub fn stage_grey_column(col: u8, values: &[u8]) -> Bytes {
    let mut params = Vec::with_capacity(1 + values.len());
    params.push(col);
    params.extend_from_slice(values);
    bare(Command::StageGreyCol, &params)
}

/// DRAW_GREY_COL_BUFFER, committing every staged column at once.
#[must_use]
pub fn commit_grey_columns() -> Bytes {
    bare(Command::DrawGreyColBuffer, &[])
}

/// Full 8-bit draw sequence: one stage command per column, then the commit.
///
/// # Errors
///
/// - `ProtocolError::GridDimensions` unless the grid is 34x9
pub fn grey_draw(grid: &PixelGrid) -> Result<Vec<Bytes>> {
    let cols = grey_columns(grid)?;
    let mut frames: Vec<Bytes> = cols
        .iter()
        .enumerate()
        .map(|(i, column)| stage_grey_column(i as u8, column))
        .collect();
    frames.push(commit_grey_columns());
    Ok(frames)
}

/// Fixed 32-byte VERSION reply.
///
/// ```text
/// byte 0    MMMMMMMM  major
/// byte 1    mmmmPPPP  minor (high nibble), patch (low nibble)
/// byte 2    0000000p  pre-release flag
/// byte 3-31 zero padding
/// ```
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct VersionReply {
    major: u8,
    minor_patch: u8,
    flags: u8,
    padding: [u8; REPLY_SIZE - 3],
}

impl VersionReply {
    /// Parse a reply (zero-copy).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::ReplyLength` unless exactly [`REPLY_SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let length_error = || ProtocolError::ReplyLength { expected: REPLY_SIZE, actual: bytes.len() };
        if bytes.len() != REPLY_SIZE {
            return Err(length_error());
        }
        Self::ref_from_bytes(bytes).map_err(|_| length_error())
    }

    /// Build a reply for the given version (used by device emulators).
    #[must_use]
    pub fn new(major: u8, minor: u8, patch: u8, pre_release: bool) -> Self {
        Self {
            major,
            minor_patch: (minor << 4) | (patch & 0x0F),
            flags: u8::from(pre_release),
            padding: [0; REPLY_SIZE - 3],
        }
    }

    /// True if bytes 3..32 are all zero.
    #[must_use]
    pub fn is_padded(&self) -> bool {
        self.padding.iter().all(|&b| b == 0)
    }

    /// Decoded version.
    #[must_use]
    pub fn version(&self) -> VersionInfo {
        VersionInfo {
            major: u16::from(self.major),
            minor: u16::from(self.minor_patch >> 4),
            patch: Some(u16::from(self.minor_patch & 0x0F)),
            pre_release: self.flags & 0x01 != 0,
        }
    }

    /// Raw reply bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; REPLY_SIZE] {
        let mut arr = [0u8; REPLY_SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }
}

/// Whether `reply` identifies this dialect: exactly 32 bytes, zero from
/// byte 3 onward.
#[must_use]
pub fn is_version_reply(reply: &[u8]) -> bool {
    VersionReply::from_bytes(reply).is_ok_and(VersionReply::is_padded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mono_frame_size() {
        assert_eq!(MONO_FRAME_SIZE, 39);
    }

    #[test]
    fn dark_grid_packs_to_zero() {
        assert_eq!(pack_mono(&PixelGrid::module()).unwrap(), [0u8; 39]);
    }

    #[test]
    fn origin_is_bit_zero() {
        let mut grid = PixelGrid::module();
        grid.set(0, 0, 1.0);
        let packed = pack_mono(&grid).unwrap();
        assert_eq!(packed[0], 0b0000_0001);
        assert!(packed[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn bit_index_is_row_major() {
        // (1, 0) is index 9: byte 1, bit 1
        let mut grid = PixelGrid::module();
        grid.set(1, 0, 0.3);
        let packed = pack_mono(&grid).unwrap();
        assert_eq!(packed[1], 0b0000_0010);

        // last pixel is index 305: byte 38, bit 1
        let mut grid = PixelGrid::module();
        grid.set(33, 8, 1.0);
        let packed = pack_mono(&grid).unwrap();
        assert_eq!(packed[38], 0b0000_0010);
    }

    #[test]
    fn wrong_dimensions_rejected() {
        let grid = PixelGrid::new(9, 34);
        assert!(matches!(pack_mono(&grid), Err(ProtocolError::GridDimensions { .. })));
        assert!(grey_draw(&grid).is_err());
    }

    #[test]
    fn grey_columns_transpose() {
        let mut grid = PixelGrid::module();
        grid.set(5, 2, 1.0);
        let cols = grey_columns(&grid).unwrap();
        assert_eq!(cols[2][5], 255);
        assert_eq!(cols[5 % MODULE_WIDTH][2], 0);
    }

    #[test]
    fn grey_draw_is_stage_per_column_then_commit() {
        let frames = grey_draw(&PixelGrid::module()).unwrap();
        assert_eq!(frames.len(), MODULE_WIDTH + 1);
        for (i, frame) in frames[..MODULE_WIDTH].iter().enumerate() {
            assert_eq!(frame.len(), 2 + MODULE_HEIGHT);
            assert_eq!(frame[0], Command::StageGreyCol.to_u8());
            assert_eq!(frame[1] as usize, i);
        }
        assert_eq!(frames[MODULE_WIDTH].as_ref(), &[0x08]);
    }

    #[test]
    fn version_request_bytes() {
        assert_eq!(version_request().as_ref(), &[0x32, 0xAC, 0x20]);
    }

    #[test]
    fn version_reply_decodes_nibbles() {
        let mut bytes = [0u8; REPLY_SIZE];
        bytes[0] = 0x00;
        bytes[1] = 0x27;
        bytes[2] = 0x01;
        let reply = VersionReply::from_bytes(&bytes).unwrap();
        assert_eq!(
            reply.version(),
            VersionInfo { major: 0, minor: 2, patch: Some(7), pre_release: true }
        );
        assert!(reply.is_padded());
    }

    #[test]
    fn version_reply_round_trips_through_constructor() {
        let reply = VersionReply::new(1, 3, 9, false);
        let bytes = reply.to_bytes();
        assert_eq!(&bytes[..3], &[1, 0x39, 0]);
        assert!(is_version_reply(&bytes));
    }

    #[test]
    fn reply_identification() {
        assert!(is_version_reply(&[0u8; 32]));
        assert!(!is_version_reply(&[0u8; 31]));
        assert!(!is_version_reply(&[0u8; 33]));

        let mut dirty = [0u8; 32];
        dirty[3] = 1;
        assert!(!is_version_reply(&dirty));

        let ident = b"Sig FW LED Matrix FW V1.2\0\0\0\0\0\0\0";
        assert!(!is_version_reply(ident));
    }

    #[test]
    fn opcode_round_trip() {
        for byte in 0..=u8::MAX {
            if let Some(cmd) = Command::from_u8(byte) {
                assert_eq!(cmd.to_u8(), byte);
            }
        }
        assert_eq!(Command::from_u8(0x20), Some(Command::Version));
        assert_eq!(Command::from_u8(0x21), None);
    }
}
