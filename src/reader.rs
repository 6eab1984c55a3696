use crate::backoff::Backoff;
use crate::invariants::{debug_assert_monotonic, debug_assert_not_lapped};
use crate::queue::{index_of, QueueInner};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Reading endpoint: waits for the expected stamp, copies the payload
/// out, advances its consumed sequence.
///
/// Obtained from [`Queue::create_reader`](crate::Queue::create_reader).
/// One `Reader` serves one logical consumer. Every read takes
/// `&mut self`, so the borrow checker rules out driving the same reader
/// from two threads at once.
///
/// A reader that exists but stops being driven keeps its place in the
/// stream: writers will stall once it is a full capacity behind. That
/// is a consequence of broadcast semantics, and dropping the handle
/// does not release the back-pressure. Padded to its own cache line so
/// neighbouring handles do not false-share.
#[repr(align(64))]
pub struct Reader<T, const N: usize> {
    queue: Arc<QueueInner<T, N>>,
    id: usize,
}

impl<T, const N: usize> Reader<T, N> {
    pub(crate) fn new(queue: Arc<QueueInner<T, N>>, id: usize) -> Self {
        Self { queue, id }
    }

    /// Consumes and returns the next item in claim order.
    ///
    /// Blocks (spinning) until the item has been published. There is no
    /// timeout; callers that need cancellation send a sentinel payload.
    pub fn read(&mut self) -> T
    where
        T: Clone,
    {
        let next = self.next_read_sequence();
        let index = index_of::<N>(next);

        self.wait_for_data(index, next);

        // SAFETY: the Acquire match on the stamp happens-after the
        // writer's Release publish of this payload, and back-pressure
        // keeps every writer out of the slot until we advance past it.
        let value = unsafe { (*self.queue.buffer[index].get()).clone() };

        self.advance(next);
        value
    }

    /// Consumes the next item into `out`, reusing its storage.
    pub fn read_into(&mut self, out: &mut T)
    where
        T: Clone,
    {
        let next = self.next_read_sequence();
        let index = index_of::<N>(next);

        self.wait_for_data(index, next);

        // SAFETY: as in `read`.
        out.clone_from(unsafe { &*self.queue.buffer[index].get() });

        self.advance(next);
    }

    /// The sequence of the last item this reader consumed, -1 before
    /// the first read.
    pub fn sequence(&self) -> i64 {
        self.queue.reader_seq(self.id).load(Ordering::Acquire)
    }

    #[inline]
    fn next_read_sequence(&self) -> i64 {
        // Relaxed: we are the only writer of our own sequence.
        self.queue.reader_seq(self.id).load(Ordering::Relaxed) + 1
    }

    /// Spin until the slot carries exactly the expected stamp.
    ///
    /// Equality is required: a larger stamp would mean the slot was
    /// reused while we lagged, which back-pressure makes impossible
    /// under correct use.
    fn wait_for_data(&self, index: usize, expected: i64) {
        let stamp_cell = &self.queue.stamps[index];

        let mut stamp = stamp_cell.load(Ordering::Acquire);
        if stamp == expected {
            return;
        }

        if self.queue.config.enable_metrics {
            self.queue.metrics.add_data_waits(1);
        }

        let mut backoff = Backoff::new();
        while stamp != expected {
            debug_assert_not_lapped!(stamp, expected);
            backoff.snooze();
            stamp = stamp_cell.load(Ordering::Acquire);
        }
    }

    /// Publish "the slot for `next` is free" to the writers.
    fn advance(&self, next: i64) {
        let seq = self.queue.reader_seq(self.id);
        debug_assert_monotonic!("consumer sequence", seq.load(Ordering::Relaxed), next);

        // Release pairs with the writers' Acquire scan in back-pressure.
        seq.store(next, Ordering::Release);

        if self.queue.config.enable_metrics {
            self.queue.metrics.add_items_read(1);
        }
    }
}

// Note: Reader intentionally does NOT implement Clone. Two handles over
// one consumer sequence would tear the read protocol apart; broadcast
// fan-out comes from registering more readers instead.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Queue;

    #[test]
    fn reads_follow_claim_order() {
        let queue = Queue::<u64, 8>::new();
        let mut reader = queue.create_reader().unwrap();
        let mut writer = queue.create_writer().unwrap();

        for i in 0..8u64 {
            writer.write(i);
        }
        for i in 0..8u64 {
            assert_eq!(reader.read(), i);
        }
    }

    #[test]
    fn sequence_tracks_consumption() {
        let queue = Queue::<u64, 8>::new();
        let mut reader = queue.create_reader().unwrap();
        let mut writer = queue.create_writer().unwrap();

        assert_eq!(reader.sequence(), -1);

        writer.write(1);
        writer.write(2);
        reader.read();
        assert_eq!(reader.sequence(), 0);
        reader.read();
        assert_eq!(reader.sequence(), 1);
    }

    #[test]
    fn read_into_replaces_destination() {
        let queue = Queue::<String, 4>::new();
        let mut reader = queue.create_reader().unwrap();
        let mut writer = queue.create_writer().unwrap();

        writer.write("fresh".to_string());

        let mut out = "stale".to_string();
        reader.read_into(&mut out);
        assert_eq!(out, "fresh");
        assert_eq!(reader.sequence(), 0);
    }

    #[test]
    fn readers_do_not_disturb_each_other() {
        let queue = Queue::<u64, 4>::new();
        let mut a = queue.create_reader().unwrap();
        let mut b = queue.create_reader().unwrap();
        let mut writer = queue.create_writer().unwrap();

        writer.write(7);
        writer.write(8);

        assert_eq!(a.read(), 7);
        assert_eq!(a.read(), 8);
        assert_eq!(b.read(), 7);
        assert_eq!(b.read(), 8);
        assert_eq!(a.sequence(), 1);
        assert_eq!(b.sequence(), 1);
    }
}
