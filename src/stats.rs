use std::sync::atomic::{AtomicU64, Ordering};

/// Relaxed-atomic throughput counters, updated only when
/// [`Config::track_stats`](crate::Config::track_stats) is set.
///
/// Relaxed ordering is sufficient: nothing branches on these values and
/// they are only read for reporting. Totals are exact once producers and
/// the consumer have quiesced.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    batches_sent: AtomicU64,
    batches_received: AtomicU64,
    reserve_retries: AtomicU64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn note_sent(&self, n: u64) {
        self.messages_sent.fetch_add(n, Ordering::Relaxed);
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn note_received(&self, n: u64) {
        self.messages_received.fetch_add(n, Ordering::Relaxed);
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn note_retry(&self) {
        self.reserve_retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_received: self.batches_received.load(Ordering::Relaxed),
            reserve_retries: self.reserve_retries.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a lane's (or a whole hub's) counters.
///
/// All zeros when stats tracking is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub batches_sent: u64,
    pub batches_received: u64,
    /// Failed attempts inside `reserve_with_backoff`; a growing value
    /// means the consumer is lagging.
    pub reserve_retries: u64,
}

impl StatsSnapshot {
    pub(crate) fn merge(&mut self, other: StatsSnapshot) {
        self.messages_sent += other.messages_sent;
        self.messages_received += other.messages_received;
        self.batches_sent += other.batches_sent;
        self.batches_received += other.batches_received;
        self.reserve_retries += other.reserve_retries;
    }
}
