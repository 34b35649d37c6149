//! Ring-decomposed lock-free MPSC channel.
//!
//! Instead of arbitrating producers against one shared queue, a
//! [`Hub`] gives every registered producer its own SPSC [`Lane`] and
//! lets the single consumer drain the lanes in turn. Producer-producer
//! contention is gone by construction; the remaining cross-core traffic
//! is one head/tail pair per lane, kept cheap by:
//!
//! - 128-byte isolation of the producer-hot and consumer-hot counters
//!   (defeats adjacent-line prefetchers, not just false sharing)
//! - cached opposing indexes, refreshed only when a fast-path check fails
//! - a zero-copy reserve/commit write path ([`WriteGrant`])
//! - batched consumption that publishes thousands of reads with a single
//!   atomic store
//!
//! Each writer's stream is FIFO; no order is defined across writers.
//!
//! # Example
//!
//! ```
//! use ringlane::{Config, Hub};
//!
//! let hub = Hub::<u64>::new(Config::default());
//! let writer = hub.register().unwrap();
//!
//! // Single items...
//! writer.push(7);
//!
//! // ...or zero-copy batches.
//! if let Some(mut grant) = writer.reserve(2) {
//!     for (i, slot) in grant.slots_mut().iter_mut().enumerate() {
//!         slot.write(10 + i as u64);
//!     }
//!     grant.commit();
//! }
//!
//! let mut sum = 0;
//! let drained = hub.consume_all(|v: &u64| sum += v);
//! assert_eq!(drained, 3);
//! assert_eq!(sum, 28);
//! ```
//!
//! The core spawns no threads, performs no blocking syscalls, and stays
//! allocation-free after construction; producers and the consumer run on
//! whatever threads the caller manages.

mod backoff;
mod config;
mod grant;
mod hub;
mod invariants;
mod lane;
#[cfg(feature = "stack")]
mod stack_lane;
mod stats;

pub use backoff::Backoff;
pub use config::Config;
pub use grant::{CommitError, WriteGrant};
pub use hub::{Hub, HubError, Writer};
pub use lane::Lane;
#[cfg(feature = "stack")]
pub use stack_lane::StackLane;
pub use stats::StatsSnapshot;
