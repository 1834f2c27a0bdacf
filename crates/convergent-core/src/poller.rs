// ── Convergence polling ──
//
// Drives one accepted mutation to a terminal status. The only suspension
// point in the core lives here: a wait that ends on the poll timer, the
// caller's cancellation token, or the deadline, whichever comes first.
// Cancellation is checked before every fetch; a fetch already in flight is
// allowed to finish.

use std::future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};

use crate::config::PollSettings;
use crate::error::{CancelCause, CoreError, OperationContext};
use crate::gateway::StatusFetcher;
use crate::model::{
    ConvergenceOperation, OperationHandle, OperationKind, Phase, StatusReport, Submission,
    TerminalStatuses,
};

/// How a polled operation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum TerminalOutcome {
    Succeeded(StatusReport),
    /// Ended in a failure status. The report carries the service's reason.
    Failed(StatusReport),
}

impl TerminalOutcome {
    pub fn report(&self) -> &StatusReport {
        match self {
            Self::Succeeded(r) | Self::Failed(r) => r,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

/// Poll `operation` until it reaches a terminal status or `cancel` fires.
pub async fn await_terminal<F>(
    operation: ConvergenceOperation,
    fetcher: &F,
    settings: &PollSettings,
    cancel: &CancellationToken,
) -> Result<TerminalOutcome, CoreError>
where
    F: StatusFetcher + ?Sized,
{
    Poller::new(fetcher, *settings)
        .with_cancellation(cancel.clone())
        .run(operation)
        .await
}

/// Configured poll loop over a status source.
pub struct Poller<'a, F: ?Sized> {
    fetcher: &'a F,
    settings: PollSettings,
    cancel: CancellationToken,
    deadline: Option<Duration>,
}

impl<'a, F> Poller<'a, F>
where
    F: StatusFetcher + ?Sized,
{
    pub fn new(fetcher: &'a F, settings: PollSettings) -> Self {
        Self {
            fetcher,
            settings,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop waiting once `deadline` has passed since [`run`](Self::run) began.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Take exclusive ownership of `operation` and poll it to completion.
    ///
    /// A status already in the success or failure set returns at once
    /// without a fetch. Fetch errors are returned as-is with operation
    /// context attached; nothing is retried here.
    pub async fn run(&self, operation: ConvergenceOperation) -> Result<TerminalOutcome, CoreError> {
        let span = info_span!(
            "await_terminal",
            kind = %operation.kind,
            handle = %operation.handle,
        );
        self.poll_loop(operation).instrument(span).await
    }

    async fn poll_loop(&self, mut op: ConvergenceOperation) -> Result<TerminalOutcome, CoreError> {
        let context = OperationContext::new(op.kind).with_handle(op.handle.clone());
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let wait = self.settings.effective_interval();
        let mut polls: u32 = 0;

        loop {
            match op.current_phase() {
                Phase::Succeeded => {
                    info!(status = %op.status(), polls, "operation converged");
                    return Ok(TerminalOutcome::Succeeded(op.report));
                }
                Phase::Failed => {
                    info!(status = %op.status(), polls, "operation failed");
                    return Ok(TerminalOutcome::Failed(op.report));
                }
                Phase::Submitted | Phase::InProgress => {}
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(CoreError::Cancelled { cause: CancelCause::Requested, context });
                }
                () = until(deadline) => {
                    return Err(CoreError::Cancelled { cause: CancelCause::DeadlineExceeded, context });
                }
                () = sleep(wait) => {}
            }

            let report = self
                .fetcher
                .fetch_status(&op.handle)
                .await
                .map_err(|e| e.with_context(&context))?;
            polls += 1;
            debug!(poll = polls, status = %report.status, "polled operation status");
            op.observe(report);
        }
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

impl ConvergenceOperation {
    /// Rebuild an in-flight operation from the service's current status,
    /// e.g. after a restart.
    pub async fn resume<F>(
        kind: OperationKind,
        handle: OperationHandle,
        terminal: TerminalStatuses,
        fetcher: &F,
    ) -> Result<Self, CoreError>
    where
        F: StatusFetcher + ?Sized,
    {
        let report = fetcher.fetch_status(&handle).await.map_err(|e| {
            e.with_context(&OperationContext::new(kind).with_handle(handle.clone()))
        })?;
        let mut op = Self::new(
            kind,
            Submission {
                handle,
                initial: report.clone(),
            },
            terminal,
        );
        op.observe(report);
        Ok(op)
    }
}
