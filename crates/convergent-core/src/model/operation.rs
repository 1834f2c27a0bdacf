// ── Asynchronous operation types ──
//
// A mutation accepted by the remote service becomes a ConvergenceOperation:
// a handle, the latest status, and the vocabulary that says which statuses
// are final.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::key::SurrogateId;

/// What an accepted mutation does to the remote object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OperationKind {
    Activate,
    Deactivate,
    Update,
}

/// A remote status value such as `PENDING`, `ACTIVATED` or `DENIED`.
///
/// Normalized to trimmed upper case so vocabularies compare reliably.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Status(String);

impl Status {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.0
    }
}

/// A status as reported by the service, with its explanation if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<SurrogateId>,
}

impl StatusReport {
    pub fn new(status: impl Into<Status>) -> Self {
        Self {
            status: status.into(),
            message: None,
            resource_id: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The service's explanation, or a generic one naming the status.
    pub fn explanation(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("operation ended with status {}", self.status))
    }
}

/// Opaque id the service returned for an accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(String);

impl OperationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the service hands back when it accepts a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub handle: OperationHandle,
    pub initial: StatusReport,
}

// ── Terminal vocabularies ───────────────────────────────────────────

/// Where a status sits in the operation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Accepted by the service; nothing polled yet.
    Submitted,
    InProgress,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// The statuses after which an operation will not change any further.
///
/// Anything in neither set is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalStatuses {
    pub success: BTreeSet<Status>,
    #[serde(default)]
    pub failure: BTreeSet<Status>,
}

impl TerminalStatuses {
    pub fn new<S, F>(success: S, failure: F) -> Self
    where
        S: IntoIterator,
        S::Item: Into<Status>,
        F: IntoIterator,
        F::Item: Into<Status>,
    {
        Self {
            success: success.into_iter().map(Into::into).collect(),
            failure: failure.into_iter().map(Into::into).collect(),
        }
    }

    /// Security-configuration activations.
    pub fn activation(kind: OperationKind) -> Self {
        let success = match kind {
            OperationKind::Activate | OperationKind::Update => "ACTIVATED",
            OperationKind::Deactivate => "DEACTIVATED",
        };
        Self::new([success], ["FAILED", "ABORTED"])
    }

    /// Traffic-steering map propagation.
    pub fn propagation() -> Self {
        Self::new(["COMPLETE"], ["DENIED"])
    }

    /// Edge hostname provisioning.
    pub fn provisioning() -> Self {
        Self::new(["ACTIVE"], ["FAILED"])
    }

    /// Classify a status. Never returns [`Phase::Submitted`].
    pub fn classify(&self, status: &Status) -> Phase {
        if self.success.contains(status) {
            Phase::Succeeded
        } else if self.failure.contains(status) {
            Phase::Failed
        } else {
            Phase::InProgress
        }
    }
}

// ── ConvergenceOperation ────────────────────────────────────────────

/// One in-flight asynchronous mutation.
///
/// Owned by exactly one poller at a time; discarded once terminal.
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceOperation {
    pub kind: OperationKind,
    pub handle: OperationHandle,
    pub report: StatusReport,
    pub terminal: TerminalStatuses,
    pub phase: Phase,
    pub submitted_at: DateTime<Utc>,
}

impl ConvergenceOperation {
    pub fn new(
        kind: OperationKind,
        submission: Submission,
        terminal: TerminalStatuses,
    ) -> Self {
        Self {
            kind,
            handle: submission.handle,
            report: submission.initial,
            terminal,
            phase: Phase::Submitted,
            submitted_at: Utc::now(),
        }
    }

    pub fn status(&self) -> &Status {
        &self.report.status
    }

    /// Record a freshly fetched status and advance the phase.
    pub(crate) fn observe(&mut self, report: StatusReport) {
        self.phase = self.terminal.classify(&report.status);
        self.report = report;
    }

    /// Phase implied by the current status, ignoring whether it was polled.
    pub fn current_phase(&self) -> Phase {
        self.terminal.classify(&self.report.status)
    }
}
