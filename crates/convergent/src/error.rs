//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use convergent_config::ConfigError;
use convergent_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const CANCELLED: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Remote ───────────────────────────────────────────────────────
    #[error("Remote service rejected the request: {message}")]
    #[diagnostic(
        code(convergent::rejected),
        help("The service will not accept this as declared. Fix the document and apply again.")
    )]
    Rejected { message: String },

    #[error("Remote service unavailable: {reason}")]
    #[diagnostic(
        code(convergent::unavailable),
        help(
            "Check that the endpoint is reachable and try again.\n\
             Use --insecure (-k) for endpoints with self-signed certificates."
        )
    )]
    Unavailable { reason: String },

    #[error("{what} not found")]
    #[diagnostic(code(convergent::not_found))]
    NotFound { what: String },

    #[error("{message}")]
    #[diagnostic(
        code(convergent::cancelled),
        help(
            "The operation may still be running remotely.\n\
             Resume with: convergent wait <handle>"
        )
    )]
    Cancelled { message: String },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(convergent::no_credentials),
        help(
            "Store a token with: convergent config set-token\n\
             Or set the CONVERGENT_TOKEN environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(convergent::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(convergent::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: convergent config init --url <URL>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No service endpoint configured")]
    #[diagnostic(
        code(convergent::no_config),
        help(
            "Create a profile with: convergent config init --url <URL>\n\
             Or pass --endpoint. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(convergent::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON document: {0}")]
    #[diagnostic(code(convergent::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML document: {0}")]
    #[diagnostic(code(convergent::yaml), help("Check the file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Unavailable { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Cancelled { .. } => exit_code::CANCELLED,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } | Self::Json(_) | Self::Yaml(_) => exit_code::USAGE,
            Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_)
            | Self::Io(_) => exit_code::GENERAL,
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::RemoteRejected { .. } => Self::Rejected { message },
            CoreError::RemoteUnavailable { .. } => Self::Unavailable { reason: message },
            CoreError::Cancelled { .. } => Self::Cancelled { message },
            CoreError::NotFound { what, .. } => Self::NotFound { what },
            CoreError::ValidationFailed { message } => Self::Validation {
                field: "document".into(),
                reason: message,
            },
            CoreError::Config { message } => Self::Validation {
                field: "endpoint".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use convergent_core::{CancelCause, OperationContext, OperationKind};

    use super::*;

    #[test]
    fn remote_errors_get_distinct_exit_codes() {
        let rejected = CliError::from(CoreError::rejected("version does not exist"));
        assert_eq!(rejected.exit_code(), exit_code::REJECTED);

        let missing = CliError::from(CoreError::not_found("operation op-9"));
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let timed_out = CliError::from(CoreError::Cancelled {
            cause: CancelCause::DeadlineExceeded,
            context: OperationContext::new(OperationKind::Update),
        });
        assert!(timed_out.to_string().contains("deadline exceeded"));
        assert_eq!(timed_out.exit_code(), exit_code::CANCELLED);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "endpoint".into(),
            reason: "invalid URL: nope".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(err.to_string(), "Invalid value for endpoint: invalid URL: nope");
    }
}
