//! Receive-side counters for the LLDP capture worker

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Point-in-time copy of the receive counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureStats {
    /// Frames handed over by the capture
    pub frames_received: u64,
    /// Total bytes of those frames
    pub bytes_received: u64,
    /// Frames that decoded into a neighbor update
    pub lldpdus_decoded: u64,
    /// Frames that were not LLDP or carried no usable TLVs
    pub frames_ignored: u64,
    /// Neighbor updates that could not be persisted
    pub store_errors: u64,
    pub duration: Duration,
}

impl CaptureStats {
    /// Frames per second over the whole capture
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames_received as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames ({} bytes), {} LLDPDUs, {} ignored, {} store errors in {:.0}s",
            self.frames_received,
            self.bytes_received,
            self.lldpdus_decoded,
            self.frames_ignored,
            self.store_errors,
            self.duration.as_secs_f64()
        )
    }
}

/// Thread-safe statistics accumulator for live capture
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    frames_received: Arc<AtomicU64>,
    bytes_received: Arc<AtomicU64>,
    lldpdus_decoded: Arc<AtomicU64>,
    frames_ignored: Arc<AtomicU64>,
    store_errors: Arc<AtomicU64>,
    start_time: Instant,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            frames_received: Arc::new(AtomicU64::new(0)),
            bytes_received: Arc::new(AtomicU64::new(0)),
            lldpdus_decoded: Arc::new(AtomicU64::new(0)),
            frames_ignored: Arc::new(AtomicU64::new(0)),
            store_errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_frame(&self, size: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn record_decoded(&self) {
        self.lldpdus_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.frames_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CaptureStats {
        CaptureStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            lldpdus_decoded: self.lldpdus_decoded.load(Ordering::Relaxed),
            frames_ignored: self.frames_ignored.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            duration: self.start_time.elapsed(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
