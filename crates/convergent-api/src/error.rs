use thiserror::Error;

/// Top-level error type for the `convergent-api` crate.
///
/// Covers every failure mode of the remote configuration service:
/// transport, authentication, validation rejections, and payload decoding.
/// `convergent-core` maps these into its reconciliation error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The service answered with a 5xx status.
    #[error("Remote service error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Throttled by the service. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Authentication ──────────────────────────────────────────────
    /// Bearer token missing, expired, or lacking permission.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Request outcome ─────────────────────────────────────────────
    /// The service refused the request payload (validation failure,
    /// conflicting state). Carries the service's explanation verbatim.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The addressed scope, operation, or item does not exist.
    #[error("Not found: {path}")]
    NotFound { path: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Server { .. } | Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }

    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Server { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
