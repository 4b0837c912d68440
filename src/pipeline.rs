//! Composition of the watch-aggregate-deploy loop.
//!
//! One aggregator task closes change events into batches; one sequential
//! consumer drains them in order. Batch N+1 never starts executing before
//! batch N's terminal result, retries included, while new events keep
//! accumulating into the next batch the whole time.

use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};

use crate::deploy::{BatchRunner, DeployError, ExecutionResult};
use crate::watcher::{Aggregator, Batch, ChangeEvent};

/// Tunables for the pipeline composition.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Quiet window closing a batch.
    pub quiet_window: Duration,
    /// Cooldown after a successful batch before the next may start.
    pub cooldown: Duration,
    /// Discard the very first batch after startup.
    pub skip_first_batch: bool,
}

/// The assembled pipeline: aggregation feeding one sequential runner.
pub struct Pipeline<R: BatchRunner> {
    options: PipelineOptions,
    runner: R,
}

impl<R: BatchRunner> Pipeline<R> {
    pub fn new(options: PipelineOptions, runner: R) -> Self {
        Self { options, runner }
    }

    /// Run until the event channel closes.
    ///
    /// Batch failures (operator declined to retry) are logged and the
    /// pipeline moves on; only a confirmation-input failure aborts the
    /// run, since without an operator no failed batch could ever be
    /// resolved.
    pub async fn run(mut self, events: mpsc::Receiver<ChangeEvent>) -> Result<(), DeployError> {
        let (batch_tx, batch_rx) = mpsc::channel::<Batch>(100);
        let aggregator =
            tokio::spawn(Aggregator::new(self.options.quiet_window).run(events, batch_tx));

        let result = self.consume(batch_rx).await;
        aggregator.abort();
        result
    }

    /// Sequential consumer: one batch at a time, in arrival order.
    async fn consume(&mut self, mut batches: mpsc::Receiver<Batch>) -> Result<(), DeployError> {
        let mut seq: usize = 0;

        while let Some(batch) = batches.recv().await {
            let index = seq;
            seq += 1;

            if self.options.skip_first_batch && index == 0 {
                crate::log_event!("pipeline", "skipped the first update");
                continue;
            }

            crate::log_event!("pipeline", "updating", "{} change(s)", batch.len());

            let outcome = self.runner.run(&batch).await?;
            crate::log_event!("pipeline", "finished", "{outcome}");

            if outcome == ExecutionResult::Success && !self.options.cooldown.is_zero() {
                sleep(self.options.cooldown).await;
            }
        }

        Ok(())
    }
}
