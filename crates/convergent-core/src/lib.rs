// convergent-core: reconciliation and convergence polling between a user's
// declared configuration and an asynchronously applied remote service.

pub mod config;
pub mod convert;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod model;
pub mod orchestrator;
pub mod poller;
pub mod reconcile;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{GatewayConfig, MINIMUM_POLL_INTERVAL, MutationOptions, PollSettings, TlsVerification};
pub use error::{CancelCause, CoreError, OperationContext};
pub use gateway::{HttpGateway, InMemoryGateway, MutationRequest, RemoteGateway, StatusFetcher};
pub use identity::{Resolution, resolve_identity};
pub use orchestrator::{MutationOrchestrator, MutationOutcome};
pub use poller::{Poller, TerminalOutcome, await_terminal};
pub use reconcile::{reconcile, reconcile_nested, reconcile_values};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Identity and items
    BusinessKey, CollectionScope, KeyPart, Keyed, RemoteItem, SurrogateId,
    // Operations
    ConvergenceOperation, DesiredState, OperationHandle, OperationKind, Phase, Status,
    StatusReport, Submission, TerminalStatuses,
    // Resource families
    ActivationRequest, AsAssignment, AsMapSpec, DefaultDatacenter, EdgeHostname, IpBehavior,
    Network, SecureNetwork,
};
