//! Rolling one-second throughput measurement
//!
//! Samples arrive at irregular intervals. The meter fills exact one-second
//! windows: the part of a sample that overshoots the window is carried into
//! the next one, proportionally split by time. A single sample spanning a
//! second or more is measured on its own and discards whatever was pending.
//!
//! All divisions truncate.

/// Length of the measurement window in milliseconds
const WINDOW_MS: u64 = 1000;

/// Byte rate calculator for one transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThroughputMeter {
    bytes_counted: u64,
    time_counted: u64,
    bytes_per_sec: u64,
}

impl ThroughputMeter {
    /// Create a meter with empty counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample
    ///
    /// `bytes_added` is the number of bytes moved since the previous sample and
    /// `time_spent` the milliseconds elapsed since then. Returns the new rate
    /// when a window was completed.
    pub fn update_counters(&mut self, bytes_added: u64, time_spent: u64) -> Option<u64> {
        if time_spent >= WINDOW_MS {
            self.bytes_counted = 0;
            self.time_counted = 0;
            self.bytes_per_sec = scale(bytes_added, WINDOW_MS, time_spent);
            return Some(self.bytes_per_sec);
        }

        let bytes_before = self.bytes_counted;
        self.bytes_counted += bytes_added;
        self.time_counted += time_spent;

        if self.time_counted < WINDOW_MS {
            return None;
        }

        let overshoot = self.time_counted - WINDOW_MS;
        let needed_time = time_spent - overshoot;
        let used_bytes = scale(bytes_added, needed_time, time_spent);

        self.bytes_per_sec = bytes_before + used_bytes;
        self.bytes_counted = bytes_added - used_bytes;
        self.time_counted = overshoot;

        Some(self.bytes_per_sec)
    }

    /// Last published rate in bytes per second (0 until the first window)
    pub fn bytes_per_sec(&self) -> u64 {
        self.bytes_per_sec
    }

    /// Bytes waiting in the current window
    pub fn bytes_counted(&self) -> u64 {
        self.bytes_counted
    }

    /// Milliseconds waiting in the current window
    pub fn time_counted(&self) -> u64 {
        self.time_counted
    }
}

/// `floor(value * numerator / denominator)` without intermediate overflow
fn scale(value: u64, numerator: u64, denominator: u64) -> u64 {
    (u128::from(value) * u128::from(numerator) / u128::from(denominator)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_state(meter: &ThroughputMeter, rate: u64, bytes: u64, time: u64) {
        assert_eq!(meter.bytes_per_sec(), rate, "rate");
        assert_eq!(meter.bytes_counted(), bytes, "bytes counted");
        assert_eq!(meter.time_counted(), time, "time counted");
    }

    #[test]
    fn test_fresh_meter() {
        assert_state(&ThroughputMeter::new(), 0, 0, 0);
    }

    #[test]
    fn test_just_under_a_second() {
        let mut meter = ThroughputMeter::new();
        assert_eq!(meter.update_counters(1024, 999), None);
        assert_state(&meter, 0, 1024, 999);
    }

    #[test]
    fn test_exactly_a_second() {
        let mut meter = ThroughputMeter::new();
        assert_eq!(meter.update_counters(1024, 1000), Some(1024));
        assert_state(&meter, 1024, 0, 0);
    }

    #[test]
    fn test_three_samples_fill_one_window() {
        let mut meter = ThroughputMeter::new();

        meter.update_counters(1024, 300);
        assert_eq!(meter.bytes_per_sec(), 0);
        meter.update_counters(1024, 450);
        assert_eq!(meter.bytes_per_sec(), 0);
        meter.update_counters(1024, 250);

        assert_state(&meter, 3072, 0, 0);
    }

    #[test]
    fn test_long_pause_truncates() {
        let mut meter = ThroughputMeter::new();
        assert_eq!(meter.update_counters(1024, 1100), Some(930));
        assert_state(&meter, 930, 0, 0);
    }

    #[test]
    fn test_long_pause_discards_pending_window() {
        let mut meter = ThroughputMeter::new();
        meter.update_counters(1024, 300);
        assert_state(&meter, 0, 1024, 300);

        meter.update_counters(1024, 2300);

        assert_state(&meter, 445, 0, 0);
    }

    #[test]
    fn test_overshoot_carries_into_next_window() {
        let mut meter = ThroughputMeter::new();
        meter.update_counters(1000, 600);

        // 400 of these 600 ms complete the window: floor(1000 * 400 / 600) = 666
        assert_eq!(meter.update_counters(1000, 600), Some(1666));
        assert_state(&meter, 1666, 334, 200);
    }

    #[test]
    fn test_bytes_are_conserved_across_windows() {
        let samples = [(700, 250), (1300, 400), (90, 130), (4000, 600), (512, 333), (2048, 900)];
        let mut meter = ThroughputMeter::new();
        let mut published = 0;

        for (bytes, time) in samples {
            if let Some(rate) = meter.update_counters(bytes, time) {
                published += rate;
            }
        }

        let added: u64 = samples.iter().map(|(bytes, _)| bytes).sum();
        assert_eq!(added, published + meter.bytes_counted());
    }

    #[test]
    fn test_long_pause_breaks_conservation() {
        let mut meter = ThroughputMeter::new();
        let mut published = 0;

        for (bytes, time) in [(1000, 600), (1000, 600)] {
            if let Some(rate) = meter.update_counters(bytes, time) {
                published += rate;
            }
        }
        assert_eq!(2000, published + meter.bytes_counted());

        // The 334 pending bytes are dropped, and the pause is measured alone
        let rate = meter.update_counters(500, 1500);
        assert_eq!(rate, Some(333));
        published += 333;

        let added = 2500;
        assert_state(&meter, 333, 0, 0);
        assert_ne!(added, published + meter.bytes_counted());
        assert_eq!(added - (published + meter.bytes_counted()), 334 + (500 - 333));
    }
}
