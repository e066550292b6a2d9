//! Session counters
//!
//! Per-session counters for handshakes, frames, and keep-alives.
//!
//! Uses atomic counters so a snapshot can be taken from any thread while the
//! session's event loop keeps updating them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for one session controller
#[derive(Debug)]
pub struct Metrics {
    /// Transport connections opened
    pub connections_total: AtomicU64,
    /// Reconnects requested after a disconnect
    pub reconnects: AtomicU64,
    /// Login or take-over attempts
    pub handshakes_total: AtomicU64,
    /// Handshakes that reached the authenticated state
    pub handshakes_success: AtomicU64,
    /// Handshakes that failed fatally
    pub handshakes_failed: AtomicU64,
    /// Binary frames received while authenticated
    pub frames_received: AtomicU64,
    /// Frames dropped for any reason
    pub frames_dropped: AtomicU64,
    /// HMAC or cipher failures
    pub integrity_failures: AtomicU64,
    /// Frames whose plaintext failed to decode
    pub decode_failures: AtomicU64,
    /// Nodes handed to the listener
    pub nodes_dispatched: AtomicU64,
    /// Keep-alive pings sent
    pub pings_sent: AtomicU64,
    /// Bytes of binary payload received
    pub bytes_received: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            handshakes_total: AtomicU64::new(0),
            handshakes_success: AtomicU64::new(0),
            handshakes_failed: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            integrity_failures: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            nodes_dispatched: AtomicU64::new(0),
            pings_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn connection_opened(&self) {
        bump(&self.connections_total);
    }

    pub fn reconnect(&self) {
        bump(&self.reconnects);
    }

    pub fn handshake_attempt(&self) {
        bump(&self.handshakes_total);
    }

    pub fn handshake_success(&self) {
        bump(&self.handshakes_success);
    }

    pub fn handshake_failed(&self) {
        bump(&self.handshakes_failed);
    }

    /// Record an inbound binary frame
    pub fn frame_received(&self, byte_count: u64) {
        bump(&self.frames_received);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn integrity_failure(&self) {
        bump(&self.integrity_failures);
        bump(&self.frames_dropped);
    }

    pub fn decode_failure(&self) {
        bump(&self.decode_failures);
        bump(&self.frames_dropped);
    }

    pub fn frame_dropped(&self) {
        bump(&self.frames_dropped);
    }

    pub fn node_dispatched(&self) {
        bump(&self.nodes_dispatched);
    }

    pub fn ping_sent(&self) {
        bump(&self.pings_sent);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            handshakes_total: self.handshakes_total.load(Ordering::Relaxed),
            handshakes_success: self.handshakes_success.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            integrity_failures: self.integrity_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            nodes_dispatched: self.nodes_dispatched.load(Ordering::Relaxed),
            pings_sent: self.pings_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            reconnects = snapshot.reconnects,
            handshakes_total = snapshot.handshakes_total,
            handshakes_success = snapshot.handshakes_success,
            handshakes_failed = snapshot.handshakes_failed,
            frames_received = snapshot.frames_received,
            frames_dropped = snapshot.frames_dropped,
            integrity_failures = snapshot.integrity_failures,
            decode_failures = snapshot.decode_failures,
            nodes_dispatched = snapshot.nodes_dispatched,
            pings_sent = snapshot.pings_sent,
            bytes_received = snapshot.bytes_received,
            uptime_seconds = snapshot.uptime_seconds,
            "Session metrics snapshot"
        );
    }
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of [`Metrics`] for assertions and reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub reconnects: u64,
    pub handshakes_total: u64,
    pub handshakes_success: u64,
    pub handshakes_failed: u64,
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub integrity_failures: u64,
    pub decode_failures: u64,
    pub nodes_dispatched: u64,
    pub pings_sent: u64,
    pub bytes_received: u64,
    pub uptime_seconds: u64,
}

/// Logs the elapsed time of an operation at debug level when dropped
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
