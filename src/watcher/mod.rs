//! File watching and change aggregation.
//!
//! Raw filesystem events flow through a bounded channel into a
//! quiet-window aggregator that closes them into ordered batches.
//!
//! # Architecture
//!
//! ```text
//! notify::RecommendedWatcher
//!       | (bounded mpsc, out-of-root paths dropped)
//!       v
//!   Aggregator  -- quiet window D, reset on every event
//!       | (bounded mpsc)
//!       v
//!   Batch consumer (pipeline)
//! ```
//!
//! The aggregator runs independently of the batch consumer, so changes
//! arriving while a deployment executes accumulate into the next batch.

mod aggregator;
mod change;
mod error;
mod source;

pub use aggregator::Aggregator;
pub use change::{Batch, ChangeEvent, ChangeKind};
pub use error::WatchError;
pub use source::ChangeSource;
