// ── Runtime configuration ──
//
// How to reach the remote service and how a mutation should be driven.
// These types never touch disk; convergent-config (or any other caller)
// builds them and hands them in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Remote propagation cadence. Status polls are never issued faster.
pub const MINIMUM_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab endpoints).
    DangerAcceptInvalid,
}

/// Connection settings for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Service base URL (e.g. `https://api.example.com/v1`).
    pub endpoint: Url,
    /// Bearer credential, if the service wants one.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Poll cadence for one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Requested wait between status fetches.
    pub interval: Duration,
    /// Absolute lower bound on that wait.
    pub floor: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: MINIMUM_POLL_INTERVAL,
            floor: MINIMUM_POLL_INTERVAL,
        }
    }
}

impl PollSettings {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// The wait actually used: never below the floor.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(self.floor)
    }
}

/// Options for [`MutationOrchestrator::perform_mutation`](crate::MutationOrchestrator::perform_mutation).
#[derive(Debug, Clone)]
pub struct MutationOptions {
    /// Block until the operation reaches a terminal status.
    pub wait_for_convergence: bool,
    pub poll: PollSettings,
    /// Fired by the caller to stop waiting.
    pub cancellation: Option<CancellationToken>,
    /// Give up waiting after this long, measured from the start of polling.
    pub deadline: Option<Duration>,
}

impl Default for MutationOptions {
    fn default() -> Self {
        Self {
            wait_for_convergence: true,
            poll: PollSettings::default(),
            cancellation: None,
            deadline: None,
        }
    }
}

impl MutationOptions {
    #[must_use]
    pub fn no_wait(mut self) -> Self {
        self.wait_for_convergence = false;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
