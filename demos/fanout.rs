//! Minimal fan-out demo: one writer, two readers, each sees the full
//! stream in order.
//!
//! Run with: `cargo run --example fanout --release`

use ringcast::Queue;
use std::thread;

const ITEMS: u64 = 1_000;

fn main() {
    let queue = Queue::<u64, 256>::new();
    let mut writer = queue.create_writer().unwrap();

    let consumers: Vec<_> = (0..2)
        .map(|id| {
            let mut reader = queue.create_reader().unwrap();
            thread::spawn(move || {
                let mut sum = 0u64;
                for _ in 0..ITEMS {
                    sum += reader.read();
                }
                println!("reader {} consumed {} items, sum {}", id, ITEMS, sum);
            })
        })
        .collect();

    for i in 0..ITEMS {
        writer.write(i);
    }

    for consumer in consumers {
        consumer.join().unwrap();
    }
}
