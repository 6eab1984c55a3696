//! ringcast - Lock-Free Broadcast Ring Queue
//!
//! An in-process, bounded, multi-writer / multi-reader queue built
//! around one sequenced ring buffer. Every reader observes the complete
//! stream of items in claim order (fan-out broadcast); items are never
//! partitioned across readers, and nothing unread is ever overwritten.
//! Writers back-pressure against the slowest reader instead.
//!
//! # Key Features
//!
//! - Compile-time power-of-two capacity (a bad capacity fails the build)
//! - Lock-free hot path: one fetch-add per claim, one release store per
//!   publish, acquire spins everywhere else
//! - Broadcast fan-out: readers progress independently and never
//!   contend with each other
//! - Adaptive backoff in both waits (spin with PAUSE, then yield)
//!
//! # Example
//!
//! ```
//! use ringcast::Queue;
//!
//! let queue = Queue::<u64, 1024>::new();
//! let mut writer = queue.create_writer().unwrap();
//! let mut reader = queue.create_reader().unwrap();
//!
//! writer.write(7);
//! writer.write_with(|| 6 * 7);
//!
//! assert_eq!(reader.read(), 7);
//! assert_eq!(reader.read(), 42);
//! ```
//!
//! # Setup and steady state
//!
//! All readers and writers must be created before the first write; the
//! queue seals registration once a sequence has been claimed. There is
//! no unsubscription: a reader that exists but is never driven still
//! back-pressures writers once it falls a full capacity behind.
//!
//! Reads and writes are unconditional and have no timeout; they
//! complete once the cooperating peer makes progress. Callers that need
//! cancellation wrap calls externally or send a sentinel payload.

mod backoff;
pub mod bits;
mod config;
mod invariants;
mod metrics;
mod queue;
mod reader;
mod writer;

pub use backoff::Backoff;
pub use config::Config;
pub use metrics::{Metrics, MetricsSnapshot};
pub use queue::{Queue, SetupError};
pub use reader::Reader;
pub use writer::Writer;
