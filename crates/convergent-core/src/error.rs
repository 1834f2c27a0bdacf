// ── Core error types ──
//
// User-facing errors from convergent-core. Consumers never see HTTP
// status codes or JSON parse failures directly; the
// `From<convergent_api::Error>` impl sorts transport-layer errors into
// rejected / unavailable / not-found.

use std::fmt;

use thiserror::Error;

use crate::model::{OperationHandle, OperationKind};

/// The operation a remote failure happened under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationContext {
    pub kind: OperationKind,
    pub handle: Option<OperationHandle>,
}

impl OperationContext {
    pub fn new(kind: OperationKind) -> Self {
        Self { kind, handle: None }
    }

    pub fn with_handle(mut self, handle: OperationHandle) -> Self {
        self.handle = Some(handle);
        self
    }
}

impl fmt::Display for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handle {
            Some(handle) => write!(f, "{} operation {handle}", self.kind),
            None => write!(f, "{} operation", self.kind),
        }
    }
}

/// Why polling stopped before a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    /// The caller's cancellation token fired.
    Requested,
    /// The configured deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote outcome ───────────────────────────────────────────────
    /// The service refused the mutation or the operation ended in a
    /// failure status. Never retried.
    #[error("{message}{}", in_op(context.as_ref()))]
    RemoteRejected {
        message: String,
        context: Option<OperationContext>,
    },

    /// Transport fault talking to the service. Retry is up to the caller.
    #[error("Remote service unavailable: {reason}{}", in_op(context.as_ref()))]
    RemoteUnavailable {
        reason: String,
        context: Option<OperationContext>,
    },

    #[error(
        "{context} {cause} before reaching a terminal status; \
         remote state is unknown and must be re-queried before any further mutation"
    )]
    Cancelled {
        cause: CancelCause,
        context: OperationContext,
    },

    #[error("Not found: {what}{}", in_op(context.as_ref()))]
    NotFound {
        what: String,
        context: Option<OperationContext>,
    },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

fn in_op(context: Option<&OperationContext>) -> String {
    context.map(|c| format!(" ({c})")).unwrap_or_default()
}

impl CoreError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::RemoteRejected {
            message: message.into(),
            context: None,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            context: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    /// Attach operation context to a remote error.
    ///
    /// The variant and message are left alone. An already attached context
    /// is kept, since it was recorded closer to the failure.
    #[must_use]
    pub fn with_context(self, ctx: &OperationContext) -> Self {
        match self {
            Self::RemoteRejected {
                message,
                context: None,
            } => Self::RemoteRejected {
                message,
                context: Some(ctx.clone()),
            },
            Self::RemoteUnavailable {
                reason,
                context: None,
            } => Self::RemoteUnavailable {
                reason,
                context: Some(ctx.clone()),
            },
            Self::NotFound {
                what,
                context: None,
            } => Self::NotFound {
                what,
                context: Some(ctx.clone()),
            },
            other => other,
        }
    }

    pub fn context(&self) -> Option<&OperationContext> {
        match self {
            Self::RemoteRejected { context, .. }
            | Self::RemoteUnavailable { context, .. }
            | Self::NotFound { context, .. } => context.as_ref(),
            Self::Cancelled { context, .. } => Some(context),
            Self::ValidationFailed { .. } | Self::Config { .. } => None,
        }
    }

    /// Retrying the same request will not help.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::RemoteRejected { .. } | Self::ValidationFailed { .. } | Self::Config { .. }
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteUnavailable { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<convergent_api::Error> for CoreError {
    fn from(err: convergent_api::Error) -> Self {
        match err {
            convergent_api::Error::Rejected { message, .. } => Self::RemoteRejected {
                message,
                context: None,
            },
            convergent_api::Error::Authentication { message } => Self::RemoteRejected {
                message: format!("authentication failed: {message}"),
                context: None,
            },
            convergent_api::Error::NotFound { path } => Self::NotFound {
                what: path,
                context: None,
            },
            convergent_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            convergent_api::Error::Transport(ref e)
                if e.status().map(|s| s.as_u16()) == Some(404) =>
            {
                Self::NotFound {
                    what: e.url().map(|u| u.path().to_owned()).unwrap_or_default(),
                    context: None,
                }
            }
            other => Self::RemoteUnavailable {
                reason: other.to_string(),
                context: None,
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_is_verbatim() {
        let err: CoreError = convergent_api::Error::Rejected {
            status: 422,
            message: "Version 7 is already active".into(),
        }
        .into();
        assert!(err.is_permanent());
        assert_eq!(err.to_string(), "Version 7 is already active");
    }

    #[test]
    fn context_is_appended_without_changing_variant() {
        let ctx = OperationContext::new(OperationKind::Activate)
            .with_handle(OperationHandle::new("9107"));
        let err = CoreError::from(convergent_api::Error::Server {
            status: 503,
            message: "busy".into(),
        })
        .with_context(&ctx);

        assert!(err.is_transient());
        assert_eq!(err.context(), Some(&ctx));
        assert!(err.to_string().ends_with("(ACTIVATE operation 9107)"));
    }

    #[test]
    fn not_found_maps_through() {
        let err: CoreError = convergent_api::Error::NotFound {
            path: "/scopes/x/items".into(),
        }
        .into();
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }

    #[test]
    fn cancelled_says_state_is_unknown() {
        let err = CoreError::Cancelled {
            cause: CancelCause::DeadlineExceeded,
            context: OperationContext::new(OperationKind::Update)
                .with_handle(OperationHandle::new("op-1")),
        };
        let text = err.to_string();
        assert!(text.starts_with("UPDATE operation op-1 deadline exceeded"));
        assert!(text.contains("must be re-queried"));
        assert!(err.is_cancelled());
        assert!(!err.is_permanent());
    }
}
