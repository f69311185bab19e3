//! Shared constants for the posdeck peripheral layer.
//!
//! Timing values are expressed in milliseconds so they can be used directly
//! as serde defaults for the matching configuration fields, and converted
//! with [`std::time::Duration::from_millis`] at the point of use.
//!
//! # Usage
//!
//! ```
//! use posdeck_core::constants::*;
//! use std::time::Duration;
//!
//! let ttl = Duration::from_millis(STATUS_CACHE_TTL_MS);
//! assert_eq!(ttl.as_secs(), 5);
//! assert_eq!(DEFAULT_NETWORK_PRINTER_PORT, 9100);
//! ```

// ============================================================================
// Printer Transport Defaults
// ============================================================================

/// Raw TCP port used by network receipt printers (the "JetDirect" port).
pub const DEFAULT_NETWORK_PRINTER_PORT: u16 = 9100;

/// Baud rate used when a serial printer configuration does not name one.
pub const DEFAULT_SERIAL_BAUD_RATE: u32 = 9600;

/// Timeout applied to a network printer connect attempt.
pub const NETWORK_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Timeout applied to a single USB bulk or serial write.
pub const DEVICE_WRITE_TIMEOUT_MS: u64 = 3000;

// ============================================================================
// Receipt Layout
// ============================================================================

/// Characters per line on an 80 mm roll with the default 12x24 font.
pub const RECEIPT_LINE_WIDTH: usize = 48;

/// Column width reserved for the item name on an item row.
pub const ITEM_NAME_WIDTH: usize = 24;

/// Column width reserved for the quantity on an item row.
pub const ITEM_QUANTITY_WIDTH: usize = 8;

/// Column width reserved for the unit price on an item row.
pub const ITEM_PRICE_WIDTH: usize = 16;

/// Lines fed before the cut so the last printed line clears the cutter.
pub const FEED_LINES_BEFORE_CUT: u8 = 3;

/// Lines per page of the human-readable fallback document.
pub const FALLBACK_LINES_PER_PAGE: usize = 60;

// ============================================================================
// Input Devices
// ============================================================================

/// Maximum gap between two keystrokes of the same barcode scan.
///
/// Keyboard-wedge scanners emit a whole code in a few milliseconds; humans
/// rarely type two characters less than 100 ms apart.
pub const DEFAULT_SCAN_THRESHOLD_MS: u64 = 100;

/// Period of the QR decode tick.
pub const DEFAULT_QR_SCAN_INTERVAL_MS: u64 = 500;

// ============================================================================
// Status Aggregation
// ============================================================================

/// How long a hardware status snapshot is served from cache.
pub const STATUS_CACHE_TTL_MS: u64 = 5000;

/// Timeout of the network printer reachability probe.
pub const REACHABILITY_PROBE_TIMEOUT_MS: u64 = 2000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_row_fits_line() {
        assert_eq!(
            ITEM_NAME_WIDTH + ITEM_QUANTITY_WIDTH + ITEM_PRICE_WIDTH,
            RECEIPT_LINE_WIDTH
        );
    }

    #[test]
    fn test_probe_is_shorter_than_cache_ttl() {
        assert!(REACHABILITY_PROBE_TIMEOUT_MS < STATUS_CACHE_TTL_MS);
    }
}
