//! # Collation Scheduler
//!
//! Drives a [`Collator`] on a fixed tick:
//!
//! ```text
//!          tick                 attempt finished
//!   Idle ────────▶ Collating ───────────────────▶ Idle
//!    │                 │
//!    └── shutdown ─────┴──▶ stopped (Ok)
//! ```
//!
//! The first attempt runs immediately. An attempt that outlives
//! `attempt_timeout` stops the scheduler with [`CollationError::Timeout`].
//! Shutdown mid-attempt drops the attempt, and with it the generator's
//! uncommitted transaction.

use crate::collator::Collator;
use crate::errors::{CollationError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, info_span, warn, Instrument, Span};

/// Where the scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the next tick.
    Idle,
    /// A collation attempt is running.
    Collating,
}

/// Periodic collation for one shard.
pub struct Scheduler {
    collator: Collator,
    state: Mutex<SchedulerState>,
    produced: Arc<AtomicU64>,
    span: Span,
}

impl Scheduler {
    /// Wraps `collator`.
    pub fn new(collator: Collator) -> Self {
        let span = info_span!("scheduler", shard = collator.shard_id());
        Self {
            collator,
            state: Mutex::new(SchedulerState::Idle),
            produced: Arc::new(AtomicU64::new(0)),
            span,
        }
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Counter of blocks produced so far.
    pub fn produced_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.produced)
    }

    /// Collates until `shutdown` flips or an attempt fails.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        self.run_inner(shutdown).instrument(self.span.clone()).await
    }

    async fn run_inner(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let config = self.collator.config();
        let mut ticker = time::interval(config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_ms = config.tick.as_millis() as u64,
            timeout_ms = config.attempt_timeout.as_millis() as u64,
            "collation scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {}
            }

            *self.state.lock() = SchedulerState::Collating;
            let attempt = time::timeout(config.attempt_timeout, self.collator.collate());
            let outcome = tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    *self.state.lock() = SchedulerState::Idle;
                    info!("shutdown during collation, attempt abandoned");
                    break;
                }
                outcome = attempt => outcome,
            };
            *self.state.lock() = SchedulerState::Idle;

            match outcome {
                Ok(Ok(Some(generated))) => {
                    self.produced.fetch_add(1, Ordering::Relaxed);
                    debug!(block = generated.block.id, "attempt produced a block");
                }
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "collation failed");
                    return Err(err);
                }
                Err(_) => {
                    let err = CollationError::Timeout {
                        shard_id: config.shard_id,
                        after: config.attempt_timeout,
                    };
                    warn!(error = %err, "collation attempt exceeded its deadline");
                    return Err(err);
                }
            }
        }

        info!("collation scheduler stopped");
        Ok(())
    }
}
