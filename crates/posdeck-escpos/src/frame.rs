use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// Semantic tag attached to every command frame.
///
/// The tag does not change the bytes sent to the printer; it exists so that
/// callers and tests can reason about frame order without decoding bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTag {
    /// `ESC @` printer reset.
    Init,
    /// `ESC a n` justification.
    Align,
    /// `ESC E n` emphasis.
    Bold,
    /// `GS ! n` character size.
    Size,
    /// Printable text.
    Text,
    /// `GS V m` paper cut.
    Cut,
    /// `ESC d n` paper feed.
    Feed,
    /// `ESC p m t1 t2` drawer pulse.
    DrawerKick,
}

impl fmt::Display for FrameTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Align => "align",
            Self::Bold => "bold",
            Self::Size => "size",
            Self::Text => "text",
            Self::Cut => "cut",
            Self::Feed => "feed",
            Self::DrawerKick => "drawer-kick",
        };
        f.write_str(name)
    }
}

/// One semantically tagged chunk of printer protocol bytes.
///
/// Frames are the encoder's output unit. A receipt is an ordered list of
/// frames that is sent frame by frame, in order, and never reordered.
///
/// # Examples
///
/// ```
/// use posdeck_escpos::{CommandFrame, FrameTag};
///
/// let frame = CommandFrame::new(FrameTag::Init, vec![0x1B, 0x40]);
/// assert_eq!(frame.tag(), FrameTag::Init);
/// assert_eq!(frame.as_bytes(), &[0x1B, 0x40]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    tag: FrameTag,
    data: Bytes,
}

impl CommandFrame {
    /// Create a frame from a tag and its bytes.
    pub fn new(tag: FrameTag, data: impl Into<Bytes>) -> Self {
        Self {
            tag,
            data: data.into(),
        }
    }

    /// Create a frame from a static byte sequence without copying.
    pub fn from_static(tag: FrameTag, data: &'static [u8]) -> Self {
        Self {
            tag,
            data: Bytes::from_static(data),
        }
    }

    pub fn tag(&self) -> FrameTag {
        self.tag
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Concatenate frames into a single byte stream, preserving order.
pub fn concat_frames(frames: &[CommandFrame]) -> Bytes {
    let total = frames.iter().map(CommandFrame::len).sum();
    let mut buf = BytesMut::with_capacity(total);
    for frame in frames {
        buf.put_slice(frame.as_bytes());
    }
    buf.freeze()
}
