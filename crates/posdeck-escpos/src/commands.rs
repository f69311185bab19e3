//! ESC/POS command builders.
//!
//! Each function returns one [`CommandFrame`] for a single printer command.
//! Only the subset of ESC/POS needed for text receipts is covered:
//!
//! | Command | Bytes | Builder |
//! |---------|-------|---------|
//! | Initialize | `1B 40` | [`initialize`] |
//! | Emphasis | `1B 45 n` | [`bold`] |
//! | Justification | `1B 61 n` | [`align`] |
//! | Character size | `1D 21 n` | [`character_size`] |
//! | Feed n lines | `1B 64 n` | [`feed_lines`] |
//! | Full cut | `1D 56 00` | [`full_cut`] |
//! | Drawer pulse | `1B 70 00 19 FF` | [`drawer_pulse`] |
//!
//! Text is sent as the UTF-8 bytes of the formatted string, minus any control
//! characters other than LF, so receipt content can never smuggle in a
//! command. The stream is fire-and-forget: no status is read back and no
//! checksum is appended.

use crate::frame::{CommandFrame, FrameTag};

/// ESC - command prefix.
pub const ESC: u8 = 0x1B;

/// GS - extended command prefix.
pub const GS: u8 = 0x1D;

/// LF - print buffer and advance one line.
pub const LF: u8 = 0x0A;

const INITIALIZE: [u8; 2] = [ESC, b'@'];
const BOLD_ON: [u8; 3] = [ESC, b'E', 1];
const BOLD_OFF: [u8; 3] = [ESC, b'E', 0];
const ALIGN_LEFT: [u8; 3] = [ESC, b'a', 0];
const ALIGN_CENTER: [u8; 3] = [ESC, b'a', 1];
const ALIGN_RIGHT: [u8; 3] = [ESC, b'a', 2];
const SIZE_NORMAL: [u8; 3] = [GS, b'!', 0x00];
const SIZE_DOUBLE: [u8; 3] = [GS, b'!', 0x11];
const FULL_CUT: [u8; 3] = [GS, b'V', 0x00];

/// Pulse drawer pin 2: on for 0x19 * 2 ms, off for 0xFF * 2 ms.
const DRAWER_PULSE: [u8; 5] = [ESC, b'p', 0x00, 0x19, 0xFF];

/// Horizontal justification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Character magnification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSize {
    Normal,
    /// Double width and double height.
    Double,
}

/// Reset the printer to its power-on state.
pub fn initialize() -> CommandFrame {
    CommandFrame::from_static(FrameTag::Init, &INITIALIZE)
}

/// Turn emphasized printing on or off.
pub fn bold(enabled: bool) -> CommandFrame {
    let bytes: &'static [u8] = if enabled { &BOLD_ON } else { &BOLD_OFF };
    CommandFrame::from_static(FrameTag::Bold, bytes)
}

/// Set the justification for subsequent lines.
pub fn align(alignment: Alignment) -> CommandFrame {
    let bytes: &'static [u8] = match alignment {
        Alignment::Left => &ALIGN_LEFT,
        Alignment::Center => &ALIGN_CENTER,
        Alignment::Right => &ALIGN_RIGHT,
    };
    CommandFrame::from_static(FrameTag::Align, bytes)
}

/// Select character magnification.
pub fn character_size(size: CharacterSize) -> CommandFrame {
    let bytes: &'static [u8] = match size {
        CharacterSize::Normal => &SIZE_NORMAL,
        CharacterSize::Double => &SIZE_DOUBLE,
    };
    CommandFrame::from_static(FrameTag::Size, bytes)
}

/// Print a line of text followed by LF.
///
/// Control characters other than LF are dropped.
pub fn text_line(text: &str) -> CommandFrame {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    let mut utf8 = [0u8; 4];
    for c in text.chars().filter(|&c| c == '\n' || !c.is_control()) {
        bytes.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }
    bytes.push(LF);
    CommandFrame::new(FrameTag::Text, bytes)
}

/// Print the buffer and feed `lines` lines.
pub fn feed_lines(lines: u8) -> CommandFrame {
    CommandFrame::new(FrameTag::Feed, vec![ESC, b'd', lines])
}

/// Full paper cut.
pub fn full_cut() -> CommandFrame {
    CommandFrame::from_static(FrameTag::Cut, &FULL_CUT)
}

/// Energize the cash drawer solenoid through the printer's kick port.
pub fn drawer_pulse() -> CommandFrame {
    CommandFrame::from_static(FrameTag::DrawerKick, &DRAWER_PULSE)
}
