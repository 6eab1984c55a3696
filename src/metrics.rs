use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe metrics for monitoring queue traffic.
///
/// Uses atomic counters with `Relaxed` ordering since these are purely
/// statistical - no control flow depends on exact values, and eventual
/// visibility is acceptable for observability.
#[derive(Debug)]
pub struct Metrics {
    items_written: AtomicU64,
    items_read: AtomicU64,
    wrap_waits: AtomicU64,
    data_waits: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            items_written: AtomicU64::new(0),
            items_read: AtomicU64::new(0),
            wrap_waits: AtomicU64::new(0),
            data_waits: AtomicU64::new(0),
        }
    }

    /// Increment the published-items counter.
    #[inline]
    pub(crate) fn add_items_written(&self, n: u64) {
        self.items_written.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment the consumed-items counter.
    #[inline]
    pub(crate) fn add_items_read(&self, n: u64) {
        self.items_read.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment the writer wrap-wait counter (entered back-pressure).
    #[inline]
    pub(crate) fn add_wrap_waits(&self, n: u64) {
        self.wrap_waits.fetch_add(n, Ordering::Relaxed);
    }

    /// Increment the reader data-wait counter (slot not yet published).
    #[inline]
    pub(crate) fn add_data_waits(&self, n: u64) {
        self.data_waits.fetch_add(n, Ordering::Relaxed);
    }

    /// Take a snapshot of current metrics values.
    ///
    /// Returns a plain struct with `u64` values that can be copied and
    /// compared.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_written: self.items_written.load(Ordering::Relaxed),
            items_read: self.items_read.load(Ordering::Relaxed),
            wrap_waits: self.wrap_waits.load(Ordering::Relaxed),
            data_waits: self.data_waits.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of metrics values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    /// Items published by all writers.
    pub items_written: u64,
    /// Items consumed by all readers combined.
    pub items_read: u64,
    /// Times a writer entered its wrap wait.
    pub wrap_waits: u64,
    /// Times a reader entered its data wait.
    pub data_waits: u64,
}
