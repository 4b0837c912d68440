//! Quiet-window aggregation of change events into batches.
//!
//! Bursts of edits separated by quiet periods close into one batch each.
//! The window timer resets on every incoming event; when it elapses with
//! no new event, the accumulated events are emitted downstream in arrival
//! order and a new window begins immediately.

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, sleep_until};

use super::change::{Batch, ChangeEvent};

/// Coalesces the live change stream into ordered batches.
///
/// Batches are produced in strict arrival order and never merged or
/// reordered. Because the aggregator runs on its own task, events arriving
/// while a previous batch is still executing accumulate into the next
/// batch instead of being dropped.
#[derive(Debug)]
pub struct Aggregator {
    /// Quiet window: how long the stream must stay silent before the
    /// pending events close into a batch.
    window: Duration,
}

impl Aggregator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Drain the event channel into the batch channel.
    ///
    /// Runs until the event channel closes (remaining pending events are
    /// flushed as a final batch) or the batch receiver is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<ChangeEvent>, batches: mpsc::Sender<Batch>) {
        let mut pending: Batch = Vec::new();
        // Deadline is armed only while events are pending, so an idle
        // stream produces no batches.
        let mut deadline: Option<Instant> = None;

        loop {
            match deadline {
                Some(due) => {
                    tokio::select! {
                        maybe = events.recv() => match maybe {
                            Some(event) => {
                                crate::debug_event!(
                                    "aggregator",
                                    "buffered",
                                    "{} {}",
                                    event.kind,
                                    event.path.display()
                                );
                                pending.push(event);
                                deadline = Some(Instant::now() + self.window);
                            }
                            None => {
                                if !pending.is_empty() {
                                    let _ = batches.send(std::mem::take(&mut pending)).await;
                                }
                                break;
                            }
                        },
                        _ = sleep_until(due) => {
                            deadline = None;
                            let batch = std::mem::take(&mut pending);
                            crate::debug_event!("aggregator", "batch closed", "{} change(s)", batch.len());
                            if batches.send(batch).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                None => match events.recv().await {
                    Some(event) => {
                        crate::debug_event!(
                            "aggregator",
                            "buffered",
                            "{} {}",
                            event.kind,
                            event.path.display()
                        );
                        pending.push(event);
                        deadline = Some(Instant::now() + self.window);
                    }
                    None => break,
                },
            }
        }
    }
}
