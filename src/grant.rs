use crate::Lane;
use std::mem::MaybeUninit;
use thiserror::Error;

/// Error from a checked commit of more slots than the grant holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot commit {requested} items, only {granted} granted")]
pub struct CommitError {
    /// Number of items the caller tried to commit.
    pub requested: usize,
    /// Number of slots actually granted.
    pub granted: usize,
}

/// Exclusive write access to a contiguous run of lane slots.
///
/// Obtained from [`Lane::reserve`]; the slots stay invisible to the
/// consumer until one of the commit methods publishes them. Dropping a
/// grant without committing abandons the slots (the next `reserve` hands
/// them out again).
///
/// A grant may hold **fewer slots than requested**: reservations never
/// wrap past the physical end of the buffer, so a request near the end is
/// clipped to the remaining contiguous run. Check [`len`](Self::len),
/// commit, and reserve again for the rest.
pub struct WriteGrant<'a, T> {
    slots: &'a mut [MaybeUninit<T>],
    lane: &'a Lane<T>,
    start: u64,
}

impl<'a, T> WriteGrant<'a, T> {
    pub(crate) fn new(slots: &'a mut [MaybeUninit<T>], lane: &'a Lane<T>, start: u64) -> Self {
        Self { slots, lane, start }
    }

    /// The granted slots, ready for writing.
    #[inline]
    pub fn slots_mut(&mut self) -> &mut [MaybeUninit<T>] {
        self.slots
    }

    /// Number of granted slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Logical position of the first granted slot (the lane's tail at
    /// reserve time). Useful for stamping items with their sequence.
    #[inline]
    pub fn position(&self) -> u64 {
        self.start
    }

    /// Copies items into the grant, returning how many fit.
    pub fn fill_from(&mut self, items: &[T]) -> usize
    where
        T: Copy,
    {
        let n = self.slots.len().min(items.len());
        for (slot, item) in self.slots.iter_mut().zip(&items[..n]) {
            slot.write(*item);
        }
        n
    }

    /// Publishes every granted slot to the consumer.
    ///
    /// All slots must have been written; publishing an unwritten slot
    /// hands the consumer uninitialized memory.
    pub fn commit(self) {
        let n = self.slots.len();
        self.lane.publish(n);
    }

    /// Publishes exactly `n` slots, failing if `n` exceeds the grant.
    pub fn try_commit(self, n: usize) -> Result<(), CommitError> {
        if n > self.slots.len() {
            return Err(CommitError {
                requested: n,
                granted: self.slots.len(),
            });
        }
        self.lane.publish(n);
        Ok(())
    }

    /// Publishes `min(n, len)` slots and returns the number published.
    pub fn commit_up_to(self, n: usize) -> usize {
        let n = n.min(self.slots.len());
        self.lane.publish(n);
        n
    }
}
