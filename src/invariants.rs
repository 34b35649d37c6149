//! Debug-build assertions for the lane protocol.
//!
//! Compiled out of release builds entirely; the hot path carries no
//! checks, per the misuse contract (over-commit and over-advance are
//! caller errors).
//!
//! Head and tail are free-running u64 counters, so every comparison here
//! goes through wrapping subtraction: a forward move has a wrapped
//! distance below 2^63, a backwards move wraps into the top half. Plain
//! `>=`/`<=` would fire false positives at the 2^64 boundary.

/// Occupancy never exceeds capacity: `(tail - head) <= capacity`.
macro_rules! debug_assert_occupancy {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "lane over-committed: {} items in a {}-slot lane",
            $count,
            $capacity
        )
    };
}

/// A sequence counter only moves forward (in the wrap-aware sense).
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new.wrapping_sub($old) < (1u64 << 63),
            concat!($name, " moved backwards: {} -> {}"),
            $old,
            $new
        )
    };
}

/// The consumer never advances past the producer's published tail:
/// the wrapped distance from head to tail stays a forward one.
macro_rules! debug_assert_consumed_within {
    ($new_head:expr, $tail:expr) => {
        debug_assert!(
            $tail.wrapping_sub($new_head) < (1u64 << 63),
            "advance past published tail: head {} > tail {}",
            $new_head,
            $tail
        )
    };
}

/// Reads only touch slots the producer has published: `pos` lies inside
/// the window `[head, tail)`, measured by wrapped distance from head.
macro_rules! debug_assert_slot_published {
    ($pos:expr, $head:expr, $tail:expr) => {
        debug_assert!(
            $pos.wrapping_sub($head) < $tail.wrapping_sub($head),
            "read of unpublished slot: seq {} outside [{}, {})",
            $pos,
            $head,
            $tail
        )
    };
}

pub(crate) use debug_assert_consumed_within;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_occupancy;
pub(crate) use debug_assert_slot_published;
