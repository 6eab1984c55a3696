use crate::bits;
use crate::config::Config;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::reader::Reader;
use crate::writer::Writer;
use std::array;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// The queue coordinates any number of writers and readers over a single
// ring of `N` payload slots using one sequence space:
//
// ## Sequence Numbers
//
// Sequences are signed 64-bit and never wrap in practice. -1 is the
// sentinel for "nothing published / nothing consumed yet"; the first
// claimed sequence is 0. The slot for sequence `s` is `s & (N - 1)`.
// Each slot carries a stamp: the sequence of the most recent completed
// publication to it (-1 until first publication), so
// `stamp & (N - 1) == slot index` always holds for published slots.
//
// ## Memory Ordering Protocol
//
// **Writer (publish path):**
// 1. fetch_add `next_sequence` with Relaxed (the RMW totally orders
//    claims by itself; no payload is visible yet)
// 2. Spin while `claimed - N` is ahead of the minimum consumer sequence,
//    loading each reader's sequence with Acquire (synchronizes with the
//    reader's Release in step 3 below)
// 3. Move the payload into `buffer[claimed & (N - 1)]` (plain store,
//    protected by the protocol)
// 4. Store `stamps[index] = claimed` with Release (the sole publication
//    point; makes the payload store visible)
//
// **Reader (consume path):**
// 1. `next = own sequence + 1` with Relaxed (single-writer field)
// 2. Spin until `stamps[next & (N - 1)]` loaded with Acquire equals
//    `next` (synchronizes with the writer's Release in step 4 above)
// 3. Clone the payload out (plain load, protected by the protocol)
// 4. Store own sequence = `next` with Release (publishes "slot free"
//    to the writers' Acquire scan in step 2 above)
//
// ## Single-Writer Invariants
//
// - `buffer[i]` is written only by the writer whose claim maps to `i`,
//   and only after every reader passed the previous tenant of the slot
// - `stamps[i]` has one writer at a time for the same reason
// - each reader sequence is written only by its owning reader
//
// The registration slots and counters below are touched during setup
// only; the hot path never takes a lock.
//
// =============================================================================

/// Sequence value meaning "nothing published / nothing consumed yet".
pub(crate) const INITIAL_SEQUENCE: i64 = -1;

/// Error types for endpoint registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetupError {
    /// Too many readers registered (exceeds the `max_readers` config).
    #[error("too many readers registered (max: {max})")]
    TooManyReaders {
        /// The configured maximum number of readers.
        max: usize,
    },
    /// Too many writers registered (exceeds the `max_writers` config).
    #[error("too many writers registered (max: {max})")]
    TooManyWriters {
        /// The configured maximum number of writers.
        max: usize,
    },
    /// Registration attempted after the first write claimed a sequence.
    #[error("endpoints must be registered before any write")]
    Started,
}

/// Slot index for a sequence.
#[inline]
pub(crate) fn index_of<const N: usize>(sequence: i64) -> usize {
    bits::mod_power_of_two::<N>(sequence as usize)
}

/// Broadcast queue with compile-time capacity, in the sequenced ring
/// buffer style.
///
/// Every reader observes the complete stream of items in claim order;
/// items are never partitioned across readers. Writers share one
/// fetch-add sequence counter and back-pressure against the slowest
/// reader, so nothing unread is ever overwritten.
///
/// `Queue` is a cheap clone over shared storage. Endpoint handles hold
/// that storage alive, so the buffer outlives every [`Reader`] and
/// [`Writer`] no matter the drop order.
///
/// # Setup phase
///
/// All endpoints must be created before the first write. Registration
/// is safe from multiple setup threads and seals itself once a sequence
/// has been claimed ([`SetupError::Started`]).
///
/// # Capacity and memory
///
/// `N` must be a positive power of two and is checked at build time.
/// The payload buffer is stored inline: construction of very large
/// `N * size_of::<T>()` queues passes through the constructing thread's
/// stack, so keep capacity within stack limits or raise them.
pub struct Queue<T, const N: usize> {
    pub(crate) inner: Arc<QueueInner<T, N>>,
}

pub(crate) struct QueueInner<T, const N: usize> {
    /// Next sequence to claim, shared by all writers via fetch-add.
    pub(crate) next_sequence: CacheAligned<AtomicI64>,
    /// Per-slot publication stamps; -1 until the slot is first published.
    pub(crate) stamps: [AtomicI64; N],
    /// Payload slots, mutated only by the writer holding the matching
    /// claim.
    pub(crate) buffer: [UnsafeCell<T>; N],
    /// One consumed-sequence counter per possible reader, preallocated
    /// so writers can scan them without locking.
    reader_seqs: Box<[CacheAligned<AtomicI64>]>,
    reader_count: AtomicUsize,
    writer_count: AtomicUsize,
    pub(crate) config: Config,
    pub(crate) metrics: Metrics,
}

// Safety: slot access is coordinated by the stamp protocol above, so
// sharing the storage across threads needs nothing beyond T: Send.
unsafe impl<T: Send, const N: usize> Send for QueueInner<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for QueueInner<T, N> {}

impl<T, const N: usize> Queue<T, N> {
    /// Referencing this constant turns a bad `N` into a build failure
    /// instead of a runtime panic.
    const CAPACITY_OK: () = assert!(
        N > 0 && bits::is_power_of_two(N),
        "queue capacity must be a positive power of two"
    );

    /// Creates a queue with the default configuration.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::with_config(Config::default())
    }

    /// Creates a queue with the given configuration.
    pub fn with_config(config: Config) -> Self
    where
        T: Default,
    {
        let _ = Self::CAPACITY_OK;

        Self {
            inner: Arc::new(QueueInner {
                next_sequence: CacheAligned::new(AtomicI64::new(0)),
                // Relaxed stores are enough here: no other thread can
                // observe the stamps before the queue is shared, and
                // sharing it is itself a synchronization edge.
                stamps: array::from_fn(|_| AtomicI64::new(INITIAL_SEQUENCE)),
                buffer: array::from_fn(|_| UnsafeCell::new(T::default())),
                reader_seqs: (0..config.max_readers)
                    .map(|_| CacheAligned::new(AtomicI64::new(INITIAL_SEQUENCE)))
                    .collect(),
                reader_count: AtomicUsize::new(0),
                writer_count: AtomicUsize::new(0),
                config,
                metrics: Metrics::new(),
            }),
        }
    }

    /// Returns the compile-time capacity `N`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Registers a new reader with nothing consumed yet.
    ///
    /// Setup only: fails with [`SetupError::Started`] once any write has
    /// claimed a sequence, or with [`SetupError::TooManyReaders`] when
    /// the configured bound is exhausted.
    pub fn create_reader(&self) -> Result<Reader<T, N>, SetupError> {
        if self.inner.next_sequence.load(Ordering::Acquire) != 0 {
            return Err(SetupError::Started);
        }

        let id = self.inner.reader_count.fetch_add(1, Ordering::SeqCst);
        if id >= self.inner.config.max_readers {
            self.inner.reader_count.fetch_sub(1, Ordering::SeqCst);
            return Err(SetupError::TooManyReaders {
                max: self.inner.config.max_readers,
            });
        }

        Ok(Reader::new(Arc::clone(&self.inner), id))
    }

    /// Registers a new writer.
    ///
    /// Setup only, with the same failure modes as [`create_reader`]
    /// (bounded by `max_writers`).
    ///
    /// [`create_reader`]: Queue::create_reader
    pub fn create_writer(&self) -> Result<Writer<T, N>, SetupError> {
        if self.inner.next_sequence.load(Ordering::Acquire) != 0 {
            return Err(SetupError::Started);
        }

        let id = self.inner.writer_count.fetch_add(1, Ordering::SeqCst);
        if id >= self.inner.config.max_writers {
            self.inner.writer_count.fetch_sub(1, Ordering::SeqCst);
            return Err(SetupError::TooManyWriters {
                max: self.inner.config.max_writers,
            });
        }

        Ok(Writer::new(Arc::clone(&self.inner)))
    }

    /// Returns the number of registered readers.
    pub fn reader_count(&self) -> usize {
        self.inner
            .reader_count
            .load(Ordering::Acquire)
            .min(self.inner.config.max_readers)
    }

    /// Returns the number of registered writers.
    pub fn writer_count(&self) -> usize {
        self.inner
            .writer_count
            .load(Ordering::Acquire)
            .min(self.inner.config.max_writers)
    }

    /// Get a metrics snapshot if collection is enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        if self.inner.config.enable_metrics {
            self.inner.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl<T, const N: usize> Clone for Queue<T, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> QueueInner<T, N> {
    /// Minimum consumed sequence across all registered readers, or
    /// `i64::MAX` when there are none (writers then never wait).
    ///
    /// Acquire loads pair with each reader's Release in its advance.
    /// The result may lag reality (a reader can advance mid-scan) but
    /// never lead it, which is the safe direction for back-pressure.
    pub(crate) fn min_consumer_sequence(&self) -> i64 {
        let count = self
            .reader_count
            .load(Ordering::Acquire)
            .min(self.config.max_readers);

        let mut min = i64::MAX;
        for seq in &self.reader_seqs[..count] {
            min = min.min(seq.load(Ordering::Acquire));
        }
        min
    }

    #[inline]
    pub(crate) fn reader_seq(&self, id: usize) -> &AtomicI64 {
        &self.reader_seqs[id]
    }
}

// ---------------------------------------------------------------------
// HELPER: cache-aligned wrapper
// ---------------------------------------------------------------------

/// Wrapper type that ensures 128-byte alignment to prevent
/// prefetcher-induced false sharing on Intel/AMD CPUs (which may
/// prefetch adjacent cache lines).
#[repr(align(128))]
pub(crate) struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}
