//! Receipt to ESC/POS encoder.
//!
//! Encoding is a pure function of the document: no I/O, no clock, no
//! randomness, and it never fails. Style commands are emitted only when a
//! line's style differs from the printer's current state, so equal
//! documents always yield byte-identical frame sequences.

use crate::commands::{self, CharacterSize};
use crate::frame::CommandFrame;
use crate::layout::{LineStyle, receipt_lines};
use crate::receipt::ReceiptDocument;
use posdeck_core::constants::FEED_LINES_BEFORE_CUT;

/// Encode a receipt into the ordered frames sent to the printer.
///
/// The first frame is always the initialize command and the last frame is
/// always the full cut, preceded by a three-line feed.
///
/// # Examples
///
/// ```
/// use posdeck_escpos::{FrameTag, ReceiptDocument, encode};
///
/// let frames = encode(&ReceiptDocument::sample());
///
/// assert_eq!(frames.first().unwrap().tag(), FrameTag::Init);
/// assert_eq!(frames.last().unwrap().tag(), FrameTag::Cut);
/// ```
pub fn encode(doc: &ReceiptDocument) -> Vec<CommandFrame> {
    let lines = receipt_lines(doc);
    let mut frames = Vec::with_capacity(lines.len() * 2 + 3);
    let mut current = LineStyle::RESET;

    frames.push(commands::initialize());

    for line in &lines {
        push_style_changes(&mut frames, current, line.style);
        current = line.style;
        frames.push(commands::text_line(&line.text));
    }

    frames.push(commands::feed_lines(FEED_LINES_BEFORE_CUT));
    frames.push(commands::full_cut());
    frames
}

/// Frame that pulses the cash drawer. Usable without a receipt.
pub fn encode_cash_drawer_kick() -> CommandFrame {
    commands::drawer_pulse()
}

fn push_style_changes(frames: &mut Vec<CommandFrame>, from: LineStyle, to: LineStyle) {
    if from.align != to.align {
        frames.push(commands::align(to.align));
    }
    if from.bold != to.bold {
        frames.push(commands::bold(to.bold));
    }
    if from.double_size != to.double_size {
        let size = if to.double_size {
            CharacterSize::Double
        } else {
            CharacterSize::Normal
        };
        frames.push(commands::character_size(size));
    }
}
