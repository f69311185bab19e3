//! ESC/POS receipt protocol for the posdeck hardware layer.
//!
//! This crate turns a [`ReceiptDocument`] into printer bytes and into its
//! human-readable fallback. It performs no I/O: transports live in
//! `posdeck-hardware`.
//!
//! ```
//! use posdeck_escpos::{LineItem, ReceiptDocument, concat_frames, encode};
//!
//! let receipt = ReceiptDocument::builder("Corner Shop", "R-1", "2025-06-01")
//!     .item(LineItem::new("Milk", 1.0, 1.20))
//!     .payment_method("Card")
//!     .build();
//!
//! let bytes = concat_frames(&encode(&receipt));
//! assert_eq!(&bytes[..2], &[0x1B, 0x40]);
//! ```

pub mod commands;
pub mod encoder;
pub mod frame;
pub mod layout;
pub mod receipt;
pub mod render;

pub use commands::{Alignment, CharacterSize};
pub use encoder::{encode, encode_cash_drawer_kick};
pub use frame::{CommandFrame, FrameTag, concat_frames};
pub use receipt::{LineItem, ReceiptBuilder, ReceiptDocument, TaxLine};
pub use render::{RenderedPage, RenderedReceipt, render_receipt};
