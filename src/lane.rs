use crate::invariants::{
    debug_assert_consumed_within, debug_assert_monotonic, debug_assert_occupancy,
    debug_assert_slot_published,
};
use crate::stats::Stats;
use crate::{Backoff, Config, StatsSnapshot, WriteGrant};
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::cell::UnsafeCell;
use std::mem::{needs_drop, MaybeUninit};
use std::ptr::{self, NonNull};
use std::slice;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// =============================================================================
// SYNCHRONIZATION PROTOCOL
// =============================================================================
//
// `head` and `tail` are free-running u64 sequence counters; a slot index is
// always `seq & mask`. Occupancy is `tail.wrapping_sub(head)`, which stays
// correct across counter wrap (an accounting fiction at 2^64 items, but the
// arithmetic must hold).
//
// Producer:  load tail Relaxed (sole writer) -> judge space against
//            cached_head -> on miss, Acquire-load head and refresh the
//            cache -> write slots -> Release-store tail (publish).
// Consumer:  load head Relaxed (sole writer) -> judge availability against
//            cached_tail -> on miss, Acquire-load tail -> read slots ->
//            Release-store head (release the slots back to the producer).
//
// The Acquire/Release pair on `tail` orders slot writes before slot reads;
// the pair on `head` orders slot reads before slot reuse. No other fences
// are needed and none are used.
//
// `cached_head` and `cached_tail` live in UnsafeCell without atomics: each
// has exactly one writer (the producer resp. the consumer), which is the
// single-producer single-consumer contract this type documents but cannot
// enforce at runtime.
//
// =============================================================================

/// Producer-owned hot fields. One 128-byte region: the producer touches
/// nothing else on the fast path, and the consumer never writes here.
/// 128 rather than 64 keeps adjacent-line hardware prefetchers from
/// dragging this region into the consumer's cache.
#[repr(C, align(128))]
pub(crate) struct ProducerHot {
    pub(crate) tail: AtomicU64,
    pub(crate) cached_head: UnsafeCell<u64>,
}

impl ProducerHot {
    pub(crate) const fn new() -> Self {
        Self {
            tail: AtomicU64::new(0),
            cached_head: UnsafeCell::new(0),
        }
    }
}

/// Consumer-owned hot fields, isolated the same way.
#[repr(C, align(128))]
pub(crate) struct ConsumerHot {
    pub(crate) head: AtomicU64,
    pub(crate) cached_tail: UnsafeCell<u64>,
}

impl ConsumerHot {
    pub(crate) const fn new() -> Self {
        Self {
            head: AtomicU64::new(0),
            cached_tail: UnsafeCell::new(0),
        }
    }
}

/// Rarely touched state, kept off both hot regions.
#[repr(C, align(128))]
struct ColdState {
    active: AtomicBool,
    closed: AtomicBool,
    stats: Stats,
}

/// Fixed-capacity SPSC ring buffer, the core building block.
///
/// One producer writes through the zero-copy [`reserve`](Self::reserve) /
/// commit protocol; one consumer drains through [`readable`](Self::readable)
/// + [`advance`](Self::advance) or, on the fast path, a batched consume
/// that publishes a whole run of reads with a single atomic store.
///
/// The producer/consumer roles are a documented contract, not a runtime
/// check: at most one thread may act in each role at a time. Within a
/// [`Hub`](crate::Hub), the move-only [`Writer`](crate::Writer) handle
/// enforces the producer side by ownership.
#[repr(C)]
pub struct Lane<T> {
    producer: ProducerHot,
    consumer: ConsumerHot,
    cold: ColdState,

    capacity: usize,
    mask: usize,
    track_stats: bool,

    /// 64-byte-aligned buffer of `capacity` slots, allocated in `new` and
    /// released in `drop`. Dangling (and never dereferenced) for zero-sized
    /// `T`.
    buf: NonNull<MaybeUninit<T>>,
    layout: Layout,
}

// SAFETY: the head/tail protocol hands each slot to exactly one side at a
// time, and the cached indexes are single-writer by role. Shared access
// from a producer thread and a consumer thread is the intended use.
unsafe impl<T: Send> Send for Lane<T> {}
unsafe impl<T: Send> Sync for Lane<T> {}

impl<T> Lane<T> {
    /// Creates an empty lane with `config.capacity()` slots.
    pub fn new(config: Config) -> Self {
        let capacity = config.capacity();
        let layout = Layout::array::<MaybeUninit<T>>(capacity)
            .and_then(|l| l.align_to(64))
            .expect("lane buffer layout");

        let buf = if layout.size() == 0 {
            // Zero-sized T never touches the allocator.
            NonNull::dangling()
        } else {
            // SAFETY: layout has non-zero size. MaybeUninit slots need no
            // initialization.
            let raw = unsafe { alloc(layout) }.cast::<MaybeUninit<T>>();
            NonNull::new(raw).unwrap_or_else(|| handle_alloc_error(layout))
        };

        Self {
            producer: ProducerHot::new(),
            consumer: ConsumerHot::new(),
            cold: ColdState {
                active: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                stats: Stats::new(),
            },
            capacity,
            mask: config.mask(),
            track_stats: config.track_stats,
            buf,
            layout,
        }
    }

    // -------------------------------------------------------------------------
    // STATUS
    // -------------------------------------------------------------------------

    /// Slot count; a power of two.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index mask (`capacity - 1`).
    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Approximate occupancy. Advisory: both counters are read relaxed, so
    /// the value may be stale the moment it returns.
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.producer.tail.load(Ordering::Relaxed);
        let head = self.consumer.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.producer.tail.load(Ordering::Relaxed) == self.consumer.head.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.cold.closed.load(Ordering::Acquire)
    }

    /// True once a writer has been bound to this lane.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.cold.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self) {
        self.cold.active.store(true, Ordering::Release);
    }

    // -------------------------------------------------------------------------
    // PRODUCER SIDE
    // -------------------------------------------------------------------------

    /// Requests up to `n` contiguous writable slots.
    ///
    /// Returns `None` when `n` is zero, exceeds the capacity, or the lane
    /// lacks space even after refreshing the producer's view of `head`.
    /// The grant is clipped at the physical end of the buffer and may hold
    /// fewer than `n` slots; commit what you got and reserve again.
    pub fn reserve(&self, n: usize) -> Option<WriteGrant<'_, T>> {
        if n == 0 || n > self.capacity {
            return None;
        }

        let tail = self.producer.tail.load(Ordering::Relaxed);

        // Fast path: judge space against the stale head copy, touching no
        // consumer-written cache line.
        // SAFETY: cached_head has a single writer, the producer, which is us.
        let cached_head = unsafe { *self.producer.cached_head.get() };
        let mut space = self
            .capacity
            .saturating_sub(tail.wrapping_sub(cached_head) as usize);

        if space < n {
            // Slow path: pull the consumer's counter once, refresh, retry.
            let head = self.consumer.head.load(Ordering::Acquire);
            // SAFETY: as above.
            unsafe { *self.producer.cached_head.get() = head };
            space = self
                .capacity
                .saturating_sub(tail.wrapping_sub(head) as usize);
            if space < n {
                return None;
            }
        }

        Some(self.grant(tail, n))
    }

    /// [`reserve`](Self::reserve) with spin-then-yield retries.
    ///
    /// Gives up with `None` when the lane closes or the backoff is
    /// exhausted; the latter is a strong hint the consumer is lagging.
    /// Closure is only polled between attempts; nothing wakes a waiter
    /// early.
    pub fn reserve_with_backoff(&self, n: usize) -> Option<WriteGrant<'_, T>> {
        let mut backoff = Backoff::new();
        loop {
            if let Some(grant) = self.reserve(n) {
                return Some(grant);
            }
            if self.is_closed() || backoff.is_completed() {
                return None;
            }
            if self.track_stats {
                self.cold.stats.note_retry();
            }
            backoff.snooze();
        }
    }

    fn grant(&self, tail: u64, n: usize) -> WriteGrant<'_, T> {
        let idx = (tail as usize) & self.mask;
        // Clip at the physical end; a grant never wraps.
        let take = n.min(self.capacity - idx);

        // SAFETY: positions [tail, tail + take) are unoccupied (checked by
        // the caller against head) and only this producer hands out writes,
        // so the slice aliases nothing until commit publishes it.
        let slots = unsafe { slice::from_raw_parts_mut(self.buf.as_ptr().add(idx), take) };
        WriteGrant::new(slots, self, tail)
    }

    /// Publishes `n` written slots. Called by the grant's commit methods.
    pub(crate) fn publish(&self, n: usize) {
        let tail = self.producer.tail.load(Ordering::Relaxed);
        let new_tail = tail.wrapping_add(n as u64);

        debug_assert_monotonic!("tail", tail, new_tail);
        debug_assert_occupancy!(
            new_tail.wrapping_sub(self.consumer.head.load(Ordering::Relaxed)) as usize,
            self.capacity
        );

        self.producer.tail.store(new_tail, Ordering::Release);

        if self.track_stats {
            self.cold.stats.note_sent(n as u64);
        }
    }

    /// Enqueues one item. Returns `false` when the lane is full.
    #[inline]
    pub fn push(&self, item: T) -> bool {
        match self.reserve(1) {
            Some(mut grant) => {
                grant.slots_mut()[0].write(item);
                grant.commit();
                true
            }
            None => false,
        }
    }

    /// Copies as many items as one grant holds and commits them.
    /// Returns the number enqueued, which may be less than `items.len()`
    /// near the buffer's physical end or when space is short.
    pub fn send(&self, items: &[T]) -> usize
    where
        T: Copy,
    {
        match self.reserve(items.len()) {
            Some(mut grant) => {
                let n = grant.fill_from(items);
                grant.commit();
                n
            }
            None => 0,
        }
    }

    // -------------------------------------------------------------------------
    // CONSUMER SIDE
    // -------------------------------------------------------------------------

    /// A view of the contiguous readable prefix, or `None` when empty.
    ///
    /// Pair with [`advance`](Self::advance). This path copies nothing and
    /// drops nothing: it is meant for `Copy` payloads read in place; for
    /// owning types use the consuming batch methods, which drop each item
    /// exactly once.
    pub fn readable(&self) -> Option<&[T]> {
        let head = self.consumer.head.load(Ordering::Relaxed);

        // SAFETY: cached_tail has a single writer, the consumer, which is us.
        let mut tail = unsafe { *self.consumer.cached_tail.get() };
        let mut avail = tail.wrapping_sub(head) as usize;

        if avail == 0 {
            tail = self.producer.tail.load(Ordering::Acquire);
            // SAFETY: as above.
            unsafe { *self.consumer.cached_tail.get() = tail };
            avail = tail.wrapping_sub(head) as usize;
            if avail == 0 {
                return None;
            }
        }

        let idx = (head as usize) & self.mask;
        let take = avail.min(self.capacity - idx);

        // SAFETY: slots [head, head + take) were written before the
        // producer's Release store of tail, which our Acquire load (now or
        // on an earlier refresh) synchronized with; the producer cannot
        // reuse them until we advance head.
        Some(unsafe { slice::from_raw_parts(self.buf.as_ptr().add(idx).cast::<T>(), take) })
    }

    /// Releases `n` consumed slots back to the producer.
    ///
    /// `n` must not exceed the length of the last [`readable`] view.
    #[inline]
    pub fn advance(&self, n: usize) {
        let head = self.consumer.head.load(Ordering::Relaxed);
        let new_head = head.wrapping_add(n as u64);

        debug_assert_monotonic!("head", head, new_head);
        debug_assert_consumed_within!(new_head, self.producer.tail.load(Ordering::Relaxed));

        self.consumer.head.store(new_head, Ordering::Release);

        if self.track_stats {
            self.cold.stats.note_received(n as u64);
        }
    }

    /// Drains every currently visible item, publishing the whole batch
    /// with one Release store of `head`.
    ///
    /// Amortizing that store (and the cache-line invalidation it costs the
    /// producer) over the batch is the single largest throughput win in
    /// this design. The handler borrows each item; the item is dropped
    /// right after the call returns.
    #[inline]
    pub fn consume_batch<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(&T),
    {
        self.drain(usize::MAX, |item| handler(&item))
    }

    /// [`consume_batch`](Self::consume_batch) transferring ownership of
    /// each item to the handler. Prefer this when `T` owns heap data you
    /// want to keep.
    #[inline]
    pub fn consume_batch_owned<F>(&self, handler: F) -> usize
    where
        F: FnMut(T),
    {
        self.drain(usize::MAX, handler)
    }

    /// Drains at most `max` items with a single `head` store. Bounds the
    /// time spent in one call when producers are far ahead.
    #[inline]
    pub fn consume_up_to<F>(&self, max: usize, mut handler: F) -> usize
    where
        F: FnMut(&T),
    {
        self.drain(max, |item| handler(&item))
    }

    /// Owning variant of [`consume_up_to`](Self::consume_up_to).
    #[inline]
    pub fn consume_up_to_owned<F>(&self, max: usize, handler: F) -> usize
    where
        F: FnMut(T),
    {
        self.drain(max, handler)
    }

    fn drain<F>(&self, max: usize, mut sink: F) -> usize
    where
        F: FnMut(T),
    {
        let head = self.consumer.head.load(Ordering::Relaxed);
        let tail = self.producer.tail.load(Ordering::Acquire);

        let take = (tail.wrapping_sub(head) as usize).min(max);
        if take == 0 {
            return 0;
        }

        let end = head.wrapping_add(take as u64);
        let mut pos = head;
        // No atomics inside the loop.
        while pos != end {
            debug_assert_slot_published!(pos, head, tail);
            let idx = (pos as usize) & self.mask;
            // SAFETY: pos is in [head, tail), published by the Acquire load
            // of tail above. assume_init_read moves the item out; the slot
            // is dead until head passes it, so no double-read can occur.
            let item = unsafe { (*self.buf.as_ptr().add(idx)).assume_init_read() };
            sink(item);
            pos = pos.wrapping_add(1);
        }

        self.consumer.head.store(end, Ordering::Release);

        // Keep readable()'s fast path coherent: head may now be past the
        // stale cached tail, and the wrapped difference would read as a
        // huge availability.
        // SAFETY: cached_tail has a single writer, the consumer, which is us.
        unsafe { *self.consumer.cached_tail.get() = tail };

        if self.track_stats {
            self.cold.stats.note_received(take as u64);
        }

        take
    }

    /// Copies out up to `out.len()` items from the readable prefix.
    pub fn recv(&self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        match self.readable() {
            Some(view) => {
                let n = view.len().min(out.len());
                out[..n].copy_from_slice(&view[..n]);
                self.advance(n);
                n
            }
            None => 0,
        }
    }

    // -------------------------------------------------------------------------
    // LIFECYCLE
    // -------------------------------------------------------------------------

    /// Marks the lane closed. Irrevocable and idempotent. Producers should
    /// stop reserving once they observe it; the consumer may keep draining
    /// until empty. Backed-off producers are not woken; they poll
    /// [`is_closed`](Self::is_closed) between snoozes.
    pub fn close(&self) {
        self.cold.closed.store(true, Ordering::Release);
    }

    /// Counter snapshot; all zeros unless stats tracking is on.
    pub fn stats(&self) -> StatsSnapshot {
        if self.track_stats {
            self.cold.stats.snapshot()
        } else {
            StatsSnapshot::default()
        }
    }
}

impl<T> Drop for Lane<T> {
    fn drop(&mut self) {
        if needs_drop::<T>() {
            // Drop whatever was committed but never consumed.
            let head = self.consumer.head.load(Ordering::Relaxed);
            let tail = self.producer.tail.load(Ordering::Relaxed);
            let mut pos = head;
            while pos != tail {
                let idx = (pos as usize) & self.mask;
                // SAFETY: [head, tail) holds initialized items, and &mut
                // self guarantees no other accessor exists.
                unsafe { ptr::drop_in_place((*self.buf.as_ptr().add(idx)).as_mut_ptr()) };
                pos = pos.wrapping_add(1);
            }
        }

        if self.layout.size() != 0 {
            // SAFETY: allocated in `new` with this exact layout.
            unsafe { dealloc(self.buf.as_ptr().cast::<u8>(), self.layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Config {
        Config::new(4, 1) // 16 slots
    }

    #[test]
    fn reserve_write_commit_read_advance() {
        let lane = Lane::<u64>::new(Config::default());

        let mut grant = lane.reserve(4).unwrap();
        assert_eq!(grant.position(), 0);
        for (i, slot) in grant.slots_mut().iter_mut().enumerate() {
            slot.write((i as u64 + 1) * 100);
        }
        grant.commit();

        assert_eq!(lane.len(), 4);

        let view = lane.readable().unwrap();
        assert_eq!(view, &[100, 200, 300, 400]);
        lane.advance(4);

        assert!(lane.is_empty());
    }

    #[test]
    fn batch_consume_single_store() {
        let lane = Lane::<u64>::new(Config::default());
        for i in 0..10 {
            assert!(lane.push(i * 10));
        }

        let mut sum = 0u64;
        let consumed = lane.consume_batch(|item| sum += item);

        assert_eq!(consumed, 10);
        assert_eq!(sum, 450);
        assert!(lane.is_empty());
    }

    #[test]
    fn bounded_consume_leaves_remainder() {
        let lane = Lane::<u64>::new(Config::default());
        for i in 0..10 {
            assert!(lane.push(i * 10));
        }

        let mut sum = 0u64;
        assert_eq!(lane.consume_up_to(5, |item| sum += item), 5);
        assert_eq!(sum, 100);
        assert_eq!(lane.len(), 5);

        sum = 0;
        assert_eq!(lane.consume_up_to(10, |item| sum += item), 5);
        assert_eq!(sum, 350);
        assert!(lane.is_empty());
    }

    #[test]
    fn full_lane_rejects_and_backoff_gives_up() {
        let lane = Lane::<u64>::new(tiny());
        for i in 0..16 {
            assert!(lane.push(i));
        }

        assert!(lane.is_full());
        assert!(lane.reserve(1).is_none());
        assert!(lane.reserve_with_backoff(1).is_none());
    }

    #[test]
    fn reserve_bounds() {
        let lane = Lane::<u64>::new(tiny());
        assert!(lane.reserve(0).is_none());
        assert!(lane.reserve(17).is_none());
        assert!(lane.reserve(16).is_some());
    }

    #[test]
    fn grant_clips_at_physical_end() {
        let lane = Lane::<u64>::new(tiny());

        // Move the window so tail sits 4 slots before the physical end.
        assert_eq!(lane.send(&[0; 12]), 12);
        lane.consume_batch(|_| {});
        assert!(lane.is_empty());

        // 8 slots are free but only 4 are contiguous.
        let grant = lane.reserve(8).unwrap();
        assert_eq!(grant.len(), 4);
        assert_eq!(grant.position(), 12);
        grant.commit();

        // The wrapped remainder is contiguous from slot 0.
        let grant = lane.reserve(4).unwrap();
        assert_eq!(grant.len(), 4);
        grant.commit();
        assert_eq!(lane.len(), 8);
    }

    #[test]
    fn partial_commit_publishes_less() {
        let lane = Lane::<u64>::new(tiny());

        let mut grant = lane.reserve(8).unwrap();
        for slot in grant.slots_mut()[..3].iter_mut() {
            slot.write(7);
        }
        assert!(grant.try_commit(3).is_ok());
        assert_eq!(lane.len(), 3);

        let grant = lane.reserve(8).unwrap();
        let err = grant.try_commit(9).unwrap_err();
        assert_eq!(err.requested, 9);
        assert_eq!(err.granted, 8);
        // The failed commit published nothing.
        assert_eq!(lane.len(), 3);

        let mut grant = lane.reserve(8).unwrap();
        for slot in grant.slots_mut()[..2].iter_mut() {
            slot.write(9);
        }
        assert_eq!(grant.commit_up_to(2), 2);
        assert_eq!(lane.len(), 5);
    }

    #[test]
    fn wrap_many_times() {
        let lane = Lane::<u32>::new(Config::new(2, 1)); // 4 slots
        for round in 0..5u32 {
            for i in 0..4 {
                assert!(lane.push(round * 10 + i));
            }
            let mut seen = Vec::new();
            lane.consume_batch(|v| seen.push(*v));
            assert_eq!(
                seen,
                vec![round * 10, round * 10 + 1, round * 10 + 2, round * 10 + 3]
            );
        }
    }

    #[test]
    fn batch_drain_then_view_stays_coherent() {
        let lane = Lane::<u64>::new(tiny());
        assert_eq!(lane.send(&[1, 2, 3]), 3);
        assert_eq!(lane.consume_batch(|_| {}), 3);

        // The batched drain must leave the view path's cached tail sane.
        assert!(lane.readable().is_none());

        assert_eq!(lane.send(&[4, 5]), 2);
        let view = lane.readable().unwrap();
        assert_eq!(view, &[4, 5]);
        lane.advance(2);
        assert!(lane.is_empty());

        // And the other way round: view path first, batch after.
        assert_eq!(lane.send(&[6]), 1);
        assert_eq!(lane.recv(&mut [0u64; 4]), 1);
        assert_eq!(lane.send(&[7, 8]), 2);
        let mut sum = 0;
        assert_eq!(lane.consume_batch(|v| sum += v), 2);
        assert_eq!(sum, 15);
    }

    #[test]
    fn close_is_sticky() {
        let lane = Lane::<u64>::new(tiny());
        assert!(lane.push(1));
        lane.close();
        lane.close();
        assert!(lane.is_closed());
        // Drain-after-close is legal.
        assert_eq!(lane.consume_batch(|_| {}), 1);
        assert!(lane.is_empty() && lane.is_closed());
    }

    #[test]
    fn consuming_drops_each_item_once() {
        use std::sync::atomic::AtomicUsize;

        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROPS.store(0, Ordering::SeqCst);
        let lane = Lane::<Tracked>::new(tiny());
        for _ in 0..6 {
            assert!(lane.push(Tracked));
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 0);

        assert_eq!(lane.consume_up_to(2, |_| {}), 2);
        assert_eq!(DROPS.load(Ordering::SeqCst), 2);

        // In-flight items are dropped with the lane.
        drop(lane);
        assert_eq!(DROPS.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn owned_consume_moves_items() {
        let lane = Lane::<String>::new(tiny());
        assert!(lane.push("a".to_string()));
        assert!(lane.push("b".to_string()));

        let mut got = Vec::new();
        assert_eq!(lane.consume_batch_owned(|s| got.push(s)), 2);
        assert_eq!(got, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn stats_count_when_enabled() {
        let lane = Lane::<u64>::new(tiny().with_stats(true));
        assert_eq!(lane.send(&[1, 2, 3]), 3);
        lane.consume_batch(|_| {});

        let snap = lane.stats();
        assert_eq!(snap.messages_sent, 3);
        assert_eq!(snap.batches_sent, 1);
        assert_eq!(snap.messages_received, 3);
        assert_eq!(snap.batches_received, 1);

        let silent = Lane::<u64>::new(tiny());
        assert_eq!(silent.send(&[1]), 1);
        assert_eq!(silent.stats(), StatsSnapshot::default());
    }

    #[test]
    fn hot_regions_are_isolated() {
        let lane = Lane::<u64>::new(tiny());
        let producer = &lane.producer as *const _ as usize;
        let consumer = &lane.consumer as *const _ as usize;
        let cold = &lane.cold as *const _ as usize;

        assert_eq!(producer % 128, 0);
        assert_eq!(consumer % 128, 0);
        assert_eq!(cold % 128, 0);
        assert!(consumer - producer >= 128);
        assert!(cold - consumer >= 128);
        assert_eq!(lane.buf.as_ptr() as usize % 64, 0);
    }
}
