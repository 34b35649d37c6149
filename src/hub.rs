use crate::{Config, Lane, StatsSnapshot, WriteGrant};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HubError {
    /// Every lane already has a writer bound to it.
    #[error("producer limit reached (max: {max})")]
    ProducerLimit {
        /// The configured `max_producers`.
        max: usize,
    },
    /// The hub was closed before registration.
    #[error("hub is closed")]
    Closed,
}

/// Multi-producer single-consumer channel built by ring decomposition.
///
/// The hub owns `max_producers` independent [`Lane`]s. Each registered
/// [`Writer`] is bound to its own lane, so producers never contend with
/// each other; the single consumer drains the lanes in id order. There is
/// no ordering between writers; only each writer's own stream is FIFO.
///
/// `Hub` is cheap to clone (it is an `Arc` over the lane array); clones
/// share the same lanes. The consumer role is whichever thread calls the
/// drain methods, one at a time by contract.
pub struct Hub<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    lanes: Box<[Lane<T>]>,
    registered: AtomicUsize,
    closed: AtomicBool,
    config: Config,
}

impl<T> Hub<T> {
    /// Allocates all lanes up front. With the default configuration this
    /// is 16 lanes of 64K slots (roughly 8 MiB for a `u64` payload), so
    /// build hubs once at startup, not per task.
    pub fn new(config: Config) -> Self {
        let lanes = (0..config.max_producers)
            .map(|_| Lane::new(config))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shared: Arc::new(Shared {
                lanes,
                registered: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// Binds a new writer to the next free lane.
    ///
    /// Safe to call while the consumer is mid-drain: the new writer's lane
    /// is picked up on the consumer's next pass. The returned handle is
    /// move-only; cloning it would put two producers on one lane.
    pub fn register(&self) -> Result<Writer<T>, HubError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(HubError::Closed);
        }

        // Relaxed is enough: lane state was published when the Arc was
        // shared, and a racing drain that misses this lane only delays it
        // to the next pass.
        let id = self.shared.registered.fetch_add(1, Ordering::Relaxed);
        if id >= self.shared.config.max_producers {
            self.shared.registered.fetch_sub(1, Ordering::Relaxed);
            return Err(HubError::ProducerLimit {
                max: self.shared.config.max_producers,
            });
        }

        self.shared.lanes[id].set_active();

        Ok(Writer {
            shared: Arc::clone(&self.shared),
            id,
        })
    }

    /// Lanes with a registered writer, in id order.
    fn registered_lanes(&self) -> &[Lane<T>] {
        // A racing register may briefly push the counter past the lane
        // count before its undo; clamp rather than index out of bounds.
        let n = self
            .shared
            .registered
            .load(Ordering::Acquire)
            .min(self.shared.lanes.len());
        &self.shared.lanes[..n]
    }

    /// Copies items out of each lane in id order until `out` is full.
    /// The simple, non-batched drain.
    pub fn recv(&self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        let mut total = 0;
        for lane in self.registered_lanes() {
            if total >= out.len() {
                break;
            }
            total += lane.recv(&mut out[total..]);
        }
        total
    }

    /// Batch-drains every lane in id order. This is the fast path.
    /// Returns the total number of items handled.
    pub fn consume_all<F>(&self, mut handler: F) -> usize
    where
        F: FnMut(&T),
    {
        let mut total = 0;
        for lane in self.registered_lanes() {
            total += lane.consume_batch(&mut handler);
        }
        total
    }

    /// Batch-drains with a total budget; lower-id lanes are served first.
    pub fn consume_all_up_to<F>(&self, max_total: usize, mut handler: F) -> usize
    where
        F: FnMut(&T),
    {
        let mut total = 0;
        for lane in self.registered_lanes() {
            if total >= max_total {
                break;
            }
            total += lane.consume_up_to(max_total - total, &mut handler);
        }
        total
    }

    /// Closes the hub, then every registered lane. Writers see it via
    /// [`Writer::is_closed`]; the consumer may drain what remains.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
        for lane in self.registered_lanes() {
            lane.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Number of registered writers, never above `max_producers`.
    pub fn producer_count(&self) -> usize {
        self.shared
            .registered
            .load(Ordering::Acquire)
            .min(self.shared.config.max_producers)
    }

    /// Counters summed across all registered lanes. All zeros unless the
    /// hub was configured with stats tracking.
    pub fn stats(&self) -> StatsSnapshot {
        let mut total = StatsSnapshot::default();
        for lane in self.registered_lanes() {
            total.merge(lane.stats());
        }
        total
    }

    /// Direct access to a lane, e.g. to give one lane its own dedicated
    /// consumer thread. `None` past `max_producers`.
    pub fn lane(&self, id: usize) -> Option<&Lane<T>> {
        self.shared.lanes.get(id)
    }
}

impl<T> Clone for Hub<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Producer handle bound to one lane for its whole lifetime.
///
/// Deliberately not `Clone`: a second handle on the same lane would break
/// the single-producer protocol the lock-free fast path relies on. Move it
/// to the producing thread instead.
pub struct Writer<T> {
    shared: Arc<Shared<T>>,
    id: usize,
}

impl<T> std::fmt::Debug for Writer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer").field("id", &self.id).finish()
    }
}

impl<T> Writer<T> {
    /// The lane id this writer is bound to.
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    fn lane(&self) -> &Lane<T> {
        &self.shared.lanes[self.id]
    }

    /// See [`Lane::reserve`].
    #[inline]
    pub fn reserve(&self, n: usize) -> Option<WriteGrant<'_, T>> {
        self.lane().reserve(n)
    }

    /// See [`Lane::reserve_with_backoff`].
    #[inline]
    pub fn reserve_with_backoff(&self, n: usize) -> Option<WriteGrant<'_, T>> {
        self.lane().reserve_with_backoff(n)
    }

    /// See [`Lane::push`].
    #[inline]
    pub fn push(&self, item: T) -> bool {
        self.lane().push(item)
    }

    /// See [`Lane::send`].
    #[inline]
    pub fn send(&self, items: &[T]) -> usize
    where
        T: Copy,
    {
        self.lane().send(items)
    }

    /// Closes this writer's lane only.
    #[inline]
    pub fn close(&self) {
        self.lane().close();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.lane().is_closed()
    }
}
