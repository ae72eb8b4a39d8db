//! Pipeline runner: drives all stages concurrently and fails fast.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error};

use super::{PipelineError, PipelineStage};

/// Runs a set of connected stages to completion.
///
/// Every stage is its own task. When one returns an error the remaining
/// stages are cancelled, each failed or cancelled stage gets `on_failure`
/// once, and the first non-interruption error is returned. A panicking
/// stage counts as failed.
#[derive(Default)]
pub struct PipelineRunner {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Box<dyn PipelineStage>) {
        self.stages.push(stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub async fn run(self) -> Result<(), PipelineError> {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for mut stage in self.stages {
            let mut cancel = cancel_rx.clone();
            tasks.spawn(async move {
                let name = stage.name().to_string();
                let result = tokio::select! {
                    result = AssertUnwindSafe(stage.run()).catch_unwind() => {
                        result.unwrap_or_else(|panic| Err(PipelineError::Panicked(panic_message(panic))))
                    }
                    _ = cancelled(&mut cancel) => Err(PipelineError::Interrupted),
                };
                if result.is_err() {
                    stage.on_failure().await;
                }
                (name, result)
            });
        }

        let mut failure: Option<PipelineError> = None;

        while let Some(joined) = tasks.join_next().await {
            let (name, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => ("<unknown>".to_string(), Err(PipelineError::Panicked(e.to_string()))),
            };

            let err = match result {
                Ok(()) => {
                    debug!(stage = %name, "Stage finished");
                    continue;
                }
                Err(err) => err,
            };

            let _ = cancel_tx.send(true);

            if err.is_interrupted() {
                debug!(stage = %name, "Stage has been cancelled");
                failure.get_or_insert(err);
            } else {
                error!(stage = %name, "An exception occurred in stage: {}. Aborting...", err);
                if failure.as_ref().map_or(true, PipelineError::is_interrupted) {
                    failure = Some(err);
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => panic
            .downcast_ref::<&str>()
            .map_or_else(|| "stage panicked".to_string(), |message| message.to_string()),
    }
}

/// Resolves once cancellation is requested; never if the runner went away.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}
