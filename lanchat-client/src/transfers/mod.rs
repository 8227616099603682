//! File transfers between peers
//!
//! The registry tracks transfers and their state machine, the meter measures
//! their speed, and the executor moves the bytes over TCP.

pub mod executor;
mod meter;
mod registry;
mod types;

pub use meter::ThroughputMeter;
pub use registry::{RegisterError, TransferRegistry};
pub use types::{
    InvalidTransition, Transfer, TransferDirection, TransferError, TransferId, TransferKey,
    TransferState,
};

/// Format a byte count for display (human-readable)
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.1} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else {
        format!("{size} B")
    }
}

/// Format a speed in bytes per second for display
pub fn format_speed(bytes_per_sec: u64) -> String {
    format!("{}/s", format_size(bytes_per_sec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(2048), "2.0 KB/s");
    }
}
