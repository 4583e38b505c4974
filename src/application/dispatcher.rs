use crate::application::command::Command;
use crate::application::context::AppContext;
use crate::error::Result;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome counts for a batch of commands.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Runs commands concurrently, one tokio task per transfer.
///
/// At most `workers` transfers are in flight. Account creation is a barrier: it waits for
/// every in-flight transfer before running, so a transfer never overtakes the creation of
/// an account that precedes it in the input. Correctness under overlap is left to the
/// store's per-account locks.
pub struct Dispatcher {
    ctx: AppContext,
    permits: Arc<Semaphore>,
    tasks: JoinSet<Result<()>>,
    summary: DispatchSummary,
}

impl Dispatcher {
    pub fn new(ctx: AppContext) -> Self {
        let workers = ctx.config.workers.max(1);
        Self {
            ctx,
            permits: Arc::new(Semaphore::new(workers)),
            tasks: JoinSet::new(),
            summary: DispatchSummary::default(),
        }
    }

    pub async fn dispatch(&mut self, command: Command) {
        match command {
            Command::CreateAccount { .. } => {
                self.drain().await;
                let outcome = command.clone().execute(&self.ctx).await;
                self.record(&command, outcome);
            }
            Command::Transfer { .. } => {
                // Closed only if the semaphore is dropped, which cannot happen while self lives.
                let Ok(permit) = self.permits.clone().acquire_owned().await else {
                    return;
                };
                self.reap_finished();

                let ctx = self.ctx.clone();
                self.tasks.spawn(async move {
                    let _permit = permit;
                    let outcome = command.clone().execute(&ctx).await;
                    if let Err(e) = &outcome {
                        tracing::warn!(command = %command, error = %e, "command rejected");
                    }
                    outcome
                });
            }
        }
    }

    /// Waits for every in-flight command.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            self.count_joined(joined);
        }
    }

    /// Drains and returns the totals.
    pub async fn finish(mut self) -> DispatchSummary {
        self.drain().await;
        self.summary
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            self.count_joined(joined);
        }
    }

    fn count_joined(&mut self, joined: std::result::Result<Result<()>, tokio::task::JoinError>) {
        match joined {
            Ok(Ok(())) => self.summary.applied += 1,
            Ok(Err(_)) => self.summary.rejected += 1,
            Err(e) => {
                tracing::error!(error = %e, "transfer task failed");
                self.summary.rejected += 1;
            }
        }
    }

    fn record(&mut self, command: &Command, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.summary.applied += 1,
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "command rejected");
                self.summary.rejected += 1;
            }
        }
    }

    /// Counts a command that never reached the core, e.g. an unreadable input row.
    pub fn record_rejected(&mut self) {
        self.summary.rejected += 1;
    }
}
