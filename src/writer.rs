use crate::backoff::Backoff;
use crate::invariants::{
    debug_assert_in_window, debug_assert_monotonic, debug_assert_slot_identity,
};
use crate::queue::{index_of, QueueInner, INITIAL_SEQUENCE};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Writing endpoint: claims sequence numbers, fills slots, publishes.
///
/// Obtained from [`Queue::create_writer`](crate::Queue::create_writer).
/// Each claim is exclusively owned by the writer that made it, so any
/// number of writers interleave without ever targeting the same slot at
/// the same time.
///
/// Writes never fail and never time out; they block (spinning) only
/// while the slowest reader has not yet consumed the item the write
/// would overwrite. Padded to its own cache line so neighbouring
/// handles do not false-share.
#[repr(align(64))]
pub struct Writer<T, const N: usize> {
    queue: Arc<QueueInner<T, N>>,
    /// Strict lower bound on the slowest reader's consumed sequence.
    /// Refreshed lazily, only when a claim would otherwise have to wait.
    cached_min_consumer: i64,
}

impl<T, const N: usize> Writer<T, N> {
    pub(crate) fn new(queue: Arc<QueueInner<T, N>>) -> Self {
        Self {
            queue,
            cached_min_consumer: INITIAL_SEQUENCE,
        }
    }

    /// Publishes one item, moving it into the ring.
    pub fn write(&mut self, value: T) {
        let sequence = self.claim();
        let index = index_of::<N>(sequence);

        // SAFETY: the claimed sequence is exclusively ours and the wrap
        // wait has proven every reader past `sequence - N`, so no reader
        // is touching this slot and no other writer can map to it until
        // the window moves again.
        unsafe { *self.queue.buffer[index].get() = value };

        self.publish(index, sequence);
    }

    /// Publishes one item constructed in place by `make`.
    ///
    /// The closure runs after the claim, directly into the slot
    /// assignment. Use it when the payload is cheaper to build at the
    /// last moment than to move through the call.
    ///
    /// If `make` panics the claimed sequence is never published and
    /// every reader stalls there permanently; treat such a panic as
    /// fatal to the queue.
    pub fn write_with<F>(&mut self, make: F)
    where
        F: FnOnce() -> T,
    {
        let sequence = self.claim();
        let index = index_of::<N>(sequence);

        // SAFETY: as in `write`.
        unsafe { *self.queue.buffer[index].get() = make() };

        self.publish(index, sequence);
    }

    /// Reserve the next sequence and wait until its slot is reusable.
    fn claim(&mut self) -> i64 {
        // Relaxed is enough for the claim itself: the fetch-add totally
        // orders claims on its own, and the only happens-before edge
        // readers need is created by the Release publish.
        let sequence = self.queue.next_sequence.fetch_add(1, Ordering::Relaxed);
        self.wait_for_no_wrap(sequence);
        sequence
    }

    /// Back-pressure: spin until every reader is past the slot this
    /// claim reuses.
    ///
    /// The cached minimum may under-report the true minimum (costing an
    /// extra refresh) but never over-reports, because readers only move
    /// their sequences forward and the cache is replaced wholesale from
    /// their published values.
    fn wait_for_no_wrap(&mut self, claimed: i64) {
        let wrap_point = claimed - N as i64;
        if wrap_point <= self.cached_min_consumer {
            return;
        }

        if self.queue.config.enable_metrics {
            self.queue.metrics.add_wrap_waits(1);
        }

        let mut backoff = Backoff::new();
        loop {
            let min = self.queue.min_consumer_sequence();
            debug_assert_monotonic!("minimum consumer sequence", self.cached_min_consumer, min);
            self.cached_min_consumer = min;

            if wrap_point <= min {
                return;
            }
            backoff.snooze();
        }
    }

    /// Stamp the slot, making the payload visible to every reader.
    fn publish(&self, index: usize, sequence: i64) {
        debug_assert_slot_identity!(sequence, index, N);
        debug_assert_in_window!(sequence, self.cached_min_consumer, N);

        // Release pairs with the readers' Acquire on this stamp and
        // carries the payload store with it.
        self.queue.stamps[index].store(sequence, Ordering::Release);

        if self.queue.config.enable_metrics {
            self.queue.metrics.add_items_written(1);
        }
    }
}

// Note: Writer intentionally does NOT implement Clone. The cached
// minimum consumer sequence is single-writer state; sharing one claim
// stream through two handles would race it.
