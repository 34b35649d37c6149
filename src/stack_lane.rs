//! Allocation-free lane variant with the buffer embedded in the struct.
//!
//! [`StackLane<T, N>`] trades the safe grant API for raw pointers: the
//! buffer is part of the value, so a borrowed reservation would pin the
//! whole lane. In exchange, `buffer[idx]` is a base+offset the compiler
//! can fold, and construction performs no allocation at all: useful on
//! the stack for small capacities, or in a `Box`/arena for large ones.
//!
//! Mind the size: `StackLane<u64, 4096>` is ~33 KiB; 64K slots of `u64`
//! is over half a megabyte and will not fit most default thread stacks.

use crate::invariants::{
    debug_assert_consumed_within, debug_assert_monotonic, debug_assert_occupancy,
    debug_assert_slot_published,
};
use crate::lane::{ConsumerHot, ProducerHot};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, Ordering};

/// SPSC ring with compile-time capacity and no heap buffer.
///
/// Same head/tail protocol as [`Lane`](crate::Lane); same one-producer,
/// one-consumer contract. The producer-side API is `unsafe` because the
/// returned raw pointer carries no lifetime: the caller must write at
/// most the returned count and commit before reserving again.
pub struct StackLane<T, const N: usize> {
    producer: ProducerHot,
    consumer: ConsumerHot,
    closed: AtomicBool,
    buffer: UnsafeCell<[MaybeUninit<T>; N]>,
}

// SAFETY: identical reasoning to Lane; slot ownership is transferred by
// the release/acquire protocol on head/tail.
unsafe impl<T: Send, const N: usize> Send for StackLane<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for StackLane<T, N> {}

impl<T, const N: usize> StackLane<T, N> {
    const CAPACITY_OK: () = assert!(
        N > 0 && N.is_power_of_two(),
        "StackLane capacity must be a nonzero power of two"
    );
    const MASK: usize = N - 1;

    pub fn new() -> Self {
        let () = Self::CAPACITY_OK;
        Self {
            producer: ProducerHot::new(),
            consumer: ConsumerHot::new(),
            closed: AtomicBool::new(false),
            // SAFETY: an array of MaybeUninit is valid uninitialized.
            buffer: UnsafeCell::new(unsafe { MaybeUninit::uninit().assume_init() }),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.producer.tail.load(Ordering::Relaxed);
        let head = self.consumer.head.load(Ordering::Relaxed);
        tail.wrapping_sub(head) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Reserves up to `n` contiguous slots, returning the write cursor and
    /// how many slots it covers (clipped at the physical end, like
    /// [`Lane::reserve`](crate::Lane::reserve)).
    ///
    /// # Safety
    ///
    /// Caller is the lane's only producer, writes at most the returned
    /// count of items through the pointer, and calls [`commit`](Self::commit)
    /// with the written count before reserving again.
    pub unsafe fn reserve(&self, n: usize) -> Option<(*mut T, usize)> {
        if n == 0 || n > N {
            return None;
        }

        let tail = self.producer.tail.load(Ordering::Relaxed);

        let cached_head = *self.producer.cached_head.get();
        let mut space = N.saturating_sub(tail.wrapping_sub(cached_head) as usize);

        if space < n {
            let head = self.consumer.head.load(Ordering::Acquire);
            *self.producer.cached_head.get() = head;
            space = N.saturating_sub(tail.wrapping_sub(head) as usize);
            if space < n {
                return None;
            }
        }

        let idx = (tail as usize) & Self::MASK;
        let take = n.min(N - idx);
        // Stay in raw-pointer land; a reference to the whole array would
        // alias slots the consumer still owns.
        let base = self.buffer.get().cast::<MaybeUninit<T>>();
        Some((base.add(idx).cast::<T>(), take))
    }

    /// Publishes `n` written slots.
    ///
    /// # Safety
    ///
    /// `n` items must have been written through the last [`reserve`](Self::reserve)
    /// pointer, and `n` must not exceed the count it returned.
    pub unsafe fn commit(&self, n: usize) {
        let tail = self.producer.tail.load(Ordering::Relaxed);
        let new_tail = tail.wrapping_add(n as u64);

        debug_assert_monotonic!("tail", tail, new_tail);
        debug_assert_occupancy!(
            new_tail.wrapping_sub(self.consumer.head.load(Ordering::Relaxed)) as usize,
            N
        );

        self.producer.tail.store(new_tail, Ordering::Release);
    }

    /// A view of the contiguous readable prefix: a pointer to the first
    /// item and the run length. Returns `None` when empty.
    ///
    /// Like [`Lane::readable`](crate::Lane::readable), this neither copies
    /// nor drops; pair it with [`advance`](Self::advance).
    ///
    /// # Safety
    ///
    /// Caller is the lane's only consumer and stops using the pointer
    /// once it advances past the viewed items.
    pub unsafe fn peek(&self) -> Option<(*const T, usize)> {
        let head = self.consumer.head.load(Ordering::Relaxed);

        let mut tail = *self.consumer.cached_tail.get();
        let mut avail = tail.wrapping_sub(head) as usize;

        if avail == 0 {
            tail = self.producer.tail.load(Ordering::Acquire);
            *self.consumer.cached_tail.get() = tail;
            avail = tail.wrapping_sub(head) as usize;
            if avail == 0 {
                return None;
            }
        }

        let idx = (head as usize) & Self::MASK;
        let take = avail.min(N - idx);
        let base = self.buffer.get().cast::<MaybeUninit<T>>();
        Some((base.add(idx).cast::<T>(), take))
    }

    /// Releases `n` consumed slots back to the producer.
    ///
    /// # Safety
    ///
    /// Caller is the lane's only consumer; `n` must not exceed the length
    /// of the last [`peek`](Self::peek).
    pub unsafe fn advance(&self, n: usize) {
        let head = self.consumer.head.load(Ordering::Relaxed);
        let new_head = head.wrapping_add(n as u64);

        debug_assert_monotonic!("head", head, new_head);
        debug_assert_consumed_within!(new_head, self.producer.tail.load(Ordering::Relaxed));

        self.consumer.head.store(new_head, Ordering::Release);
    }

    /// Drains every visible item with one `head` store, passing each to
    /// the handler by value.
    ///
    /// # Safety
    ///
    /// Caller is the lane's only consumer.
    pub unsafe fn consume_batch<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        let head = self.consumer.head.load(Ordering::Relaxed);
        let tail = self.producer.tail.load(Ordering::Acquire);

        let avail = tail.wrapping_sub(head) as usize;
        if avail == 0 {
            return 0;
        }

        let base = self.buffer.get().cast::<MaybeUninit<T>>();
        let mut pos = head;
        while pos != tail {
            debug_assert_slot_published!(pos, head, tail);
            let idx = (pos as usize) & Self::MASK;
            let item = (*base.add(idx)).assume_init_read();
            handler(item);
            pos = pos.wrapping_add(1);
        }

        self.consumer.head.store(tail, Ordering::Release);
        // Keep peek()'s fast path coherent with the head we just advanced.
        *self.consumer.cached_tail.get() = tail;
        avail
    }
}

impl<T, const N: usize> Default for StackLane<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for StackLane<T, N> {
    fn drop(&mut self) {
        if std::mem::needs_drop::<T>() {
            let head = self.consumer.head.load(Ordering::Relaxed);
            let tail = self.producer.tail.load(Ordering::Relaxed);
            let buffer = self.buffer.get_mut();
            let mut pos = head;
            while pos != tail {
                let idx = (pos as usize) & Self::MASK;
                // SAFETY: [head, tail) holds initialized items and &mut
                // self is exclusive.
                unsafe { buffer[idx].assume_init_drop() };
                pos = pos.wrapping_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_drain_wrap() {
        let lane: StackLane<u64, 8> = StackLane::new();
        assert_eq!(lane.capacity(), 8);

        for round in 0..4u64 {
            // SAFETY: single-threaded test; write exactly what we commit.
            unsafe {
                let (ptr, len) = lane.reserve(8).unwrap();
                for i in 0..len {
                    ptr.add(i).write(round * 100 + i as u64);
                }
                lane.commit(len);
            }
            assert!(lane.is_full() || lane.len() > 0);

            let mut seen = Vec::new();
            // SAFETY: single consumer.
            let n = unsafe { lane.consume_batch(|v| seen.push(v)) };
            assert_eq!(n, seen.len());
            assert!(seen.iter().all(|v| v / 100 == round));
            assert!(lane.is_empty());
        }
    }

    #[test]
    fn rejects_when_full() {
        let lane: StackLane<u32, 4> = StackLane::new();
        // SAFETY: single-threaded test.
        unsafe {
            for i in 0..4 {
                let (ptr, len) = lane.reserve(1).unwrap();
                assert_eq!(len, 1);
                ptr.write(i);
                lane.commit(1);
            }
            assert!(lane.reserve(1).is_none());
        }
        assert!(lane.is_full());
    }

    #[test]
    fn reservation_clips_at_end() {
        let lane: StackLane<u8, 8> = StackLane::new();
        // SAFETY: single-threaded test.
        unsafe {
            let (ptr, len) = lane.reserve(6).unwrap();
            for i in 0..len {
                ptr.add(i).write(i as u8);
            }
            lane.commit(len);
            lane.consume_batch(|_| {});

            // Free space is 8, contiguous run to the end is 2.
            let (_, len) = lane.reserve(5).unwrap();
            assert_eq!(len, 2);
        }
    }

    #[test]
    fn peek_then_advance() {
        let lane: StackLane<u64, 8> = StackLane::new();
        // SAFETY: single-threaded test.
        unsafe {
            assert!(lane.peek().is_none());

            let (ptr, len) = lane.reserve(3).unwrap();
            for i in 0..len {
                ptr.add(i).write(10 + i as u64);
            }
            lane.commit(len);

            let (view, avail) = lane.peek().unwrap();
            assert_eq!(avail, 3);
            assert_eq!(*view, 10);
            assert_eq!(*view.add(2), 12);
            lane.advance(2);

            let (view, avail) = lane.peek().unwrap();
            assert_eq!(avail, 1);
            assert_eq!(*view, 12);
            lane.advance(1);
        }
        assert!(lane.is_empty());
    }

    #[test]
    fn batch_drain_then_peek_stays_coherent() {
        let lane: StackLane<u64, 8> = StackLane::new();
        // SAFETY: single-threaded test.
        unsafe {
            let (ptr, len) = lane.reserve(3).unwrap();
            for i in 0..len {
                ptr.add(i).write(i as u64);
            }
            lane.commit(len);
            assert_eq!(lane.consume_batch(|_| {}), 3);

            // The batched drain must leave peek's cached tail sane.
            assert!(lane.peek().is_none());

            let (ptr, len) = lane.reserve(2).unwrap();
            for i in 0..len {
                ptr.add(i).write(40 + i as u64);
            }
            lane.commit(len);

            let (view, avail) = lane.peek().unwrap();
            assert_eq!(avail, 2);
            assert_eq!(*view, 40);
            lane.advance(2);
        }
        assert!(lane.is_empty());
    }

    #[test]
    fn drops_in_flight_items() {
        use std::sync::atomic::AtomicUsize;

        static DROPS: AtomicUsize = AtomicUsize::new(0);
        struct Tracked;
        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPS.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROPS.store(0, Ordering::SeqCst);
        {
            let lane: StackLane<Tracked, 4> = StackLane::new();
            // SAFETY: single-threaded test.
            unsafe {
                for _ in 0..3 {
                    let (ptr, _) = lane.reserve(1).unwrap();
                    ptr.write(Tracked);
                    lane.commit(1);
                }
            }
        }
        assert_eq!(DROPS.load(Ordering::SeqCst), 3);
    }
}
