//! # Task Supervisor
//!
//! Runs the node's long-lived tasks side by side. All tasks share one
//! shutdown channel:
//!
//! - the first task to fail broadcasts shutdown and its error is returned
//!   once every sibling has stopped;
//! - a shutdown from the parent stops every task, and the run ends cleanly.

use crate::errors::NodeError;
use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, Instrument};

/// Fan-out runner with shared cancellation.
pub struct Runner {
    tasks: JoinSet<(String, Result<(), NodeError>)>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// An empty runner.
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            tasks: JoinSet::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Shutdown signal handed to every task.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Number of tasks spawned and not yet joined.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no task is running.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Spawns a task built from the shared shutdown signal.
    pub fn spawn<F, Fut>(&mut self, name: impl Into<String>, task: F)
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = Result<(), NodeError>> + Send + 'static,
    {
        let name = name.into();
        let future = task(self.shutdown_receiver());
        let span = info_span!("task", name = %name);
        debug!(task = %name, "task spawned");
        self.tasks
            .spawn(async move { (name, future.await) }.instrument(span));
    }

    /// Waits for every task; stops them all on the first failure or when
    /// `parent` signals shutdown.
    pub async fn run(mut self, mut parent: watch::Receiver<bool>) -> Result<(), NodeError> {
        let mut first_error = None;
        let mut stopping = false;

        loop {
            tokio::select! {
                changed = parent.changed(), if !stopping => {
                    if changed.is_ok() && !*parent.borrow() {
                        continue;
                    }
                    info!("shutdown requested, stopping tasks");
                    stopping = true;
                    self.shutdown_tx.send_replace(true);
                }
                joined = self.tasks.join_next() => {
                    let Some(joined) = joined else {
                        break;
                    };
                    let failure = match joined {
                        Ok((name, Ok(()))) => {
                            debug!(task = %name, "task finished");
                            None
                        }
                        Ok((name, Err(err))) => {
                            error!(task = %name, error = %err, "task failed");
                            Some(err)
                        }
                        Err(join_err) => {
                            error!(error = %join_err, "task panicked");
                            Some(NodeError::TaskFailed {
                                name: "unknown".to_string(),
                                reason: join_err.to_string(),
                            })
                        }
                    };
                    if let Some(err) = failure {
                        if first_error.is_none() {
                            first_error = Some(err);
                            stopping = true;
                            self.shutdown_tx.send_replace(true);
                        }
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
