//! Minimal end-to-end walkthrough: four writer threads, one consumer.
//!
//! Run with: `cargo run --release --example basic`

use ringlane::{Config, Hub};
use std::sync::Arc;
use std::thread;

const WRITERS: usize = 4;
const PER_WRITER: u64 = 1_000_000;

fn main() {
    let hub = Arc::new(Hub::<u64>::new(Config::default()));

    let mut handles = Vec::new();
    for _ in 0..WRITERS {
        let hub = Arc::clone(&hub);
        handles.push(thread::spawn(move || {
            let writer = hub.register().expect("lane available");
            for i in 0..PER_WRITER {
                while !writer.push(i) {
                    thread::yield_now();
                }
            }
        }));
    }

    let total = (WRITERS as u64) * PER_WRITER;
    let mut received = 0u64;
    let mut sum = 0u64;
    while received < total {
        received += hub.consume_all(|item| sum += item) as u64;
    }

    for handle in handles {
        handle.join().expect("writer thread");
    }

    let expected = WRITERS as u64 * (PER_WRITER * (PER_WRITER - 1) / 2);
    println!("received {received} messages, checksum {sum} (expected {expected})");
    assert_eq!(sum, expected);
}
