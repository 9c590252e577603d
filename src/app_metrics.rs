use std::time::{Duration, Instant};
use tracing::info;

/// Processing counters for the inputs and the arbiter
/// (not to be confused with the navigation channels themselves)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppMetrics {
    /// Number of CAN frames received
    pub can_frames: u64,
    /// Number of CAN bus errors encountered
    pub can_errors: u64,
    /// Number of complete NMEA2000 messages assembled
    pub n2k_messages: u64,
    /// NMEA0183 sentences that passed the checksum
    pub sentences_accepted: u64,
    /// NMEA0183 lines dropped as malformed
    pub sentences_dropped: u64,
    pub signalk_accepted: u64,
    /// SignalK messages unparseable, about other vessels, or without usable values
    pub signalk_ignored: u64,
    pub candidates_accepted: u64,
    pub candidates_rejected: u64,
    /// Channels reopened by the watchdog
    pub invalidations: u64,
}

impl AppMetrics {
    /// Create a new AppMetrics instance with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all counters to zero
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Log current metrics to the info log
    pub fn log(&self) {
        info!(
            "[Metrics] CAN frames: {}, CAN errors: {}, N2K messages: {}, 0183 sentences: {} ok/{} dropped, SignalK: {} ok/{} ignored, candidates: {} accepted/{} rejected, invalidations: {}",
            self.can_frames,
            self.can_errors,
            self.n2k_messages,
            self.sentences_accepted,
            self.sentences_dropped,
            self.signalk_accepted,
            self.signalk_ignored,
            self.candidates_accepted,
            self.candidates_rejected,
            self.invalidations
        );
    }
}

/// Manages periodic logging of application metrics
pub struct MetricsLogger {
    last_log: Instant,
    log_interval: Duration,
}

impl MetricsLogger {
    /// Create a new MetricsLogger with the specified logging interval
    pub fn new(log_interval: Duration) -> Self {
        Self {
            last_log: Instant::now(),
            log_interval,
        }
    }

    /// Logs and resets the counters once the interval has elapsed.
    /// Returns true if metrics were logged
    pub fn check_and_log(&mut self, metrics: &mut AppMetrics) -> bool {
        if self.last_log.elapsed() >= self.log_interval {
            metrics.log();
            metrics.reset();
            self.last_log = Instant::now();
            true
        } else {
            false
        }
    }
}
