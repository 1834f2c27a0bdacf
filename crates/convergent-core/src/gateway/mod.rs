// ── Remote gateway capability ──
//
// The three request shapes the core needs from the remote service. The
// gateway is passed explicitly into every operation; nothing in the core
// holds a client as ambient state.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CoreError;
use crate::model::{
    CollectionScope, OperationHandle, OperationKind, RemoteItem, StatusReport, Submission,
    SurrogateId,
};

pub use http::HttpGateway;
pub use memory::InMemoryGateway;

/// One mutation to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub scope: CollectionScope,
    pub kind: OperationKind,
    /// The existing object being changed, when identity resolution found one.
    pub target: Option<SurrogateId>,
    pub payload: Value,
}

/// Reads the current status of an accepted mutation.
///
/// Split out of [`RemoteGateway`] so the poller can be driven by anything
/// that answers status queries.
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch_status(&self, handle: &OperationHandle) -> Result<StatusReport, CoreError>;
}

/// Full remote gateway: submit, poll, and read collections.
///
/// Submission fails with `RemoteRejected` for an invalid payload and
/// `RemoteUnavailable` on transport failure. Collection reads fail with
/// `RemoteUnavailable` or `NotFound`.
#[async_trait]
pub trait RemoteGateway: StatusFetcher {
    async fn submit_mutation(&self, request: &MutationRequest) -> Result<Submission, CoreError>;

    /// Every member of a collection, in the service's order.
    async fn fetch_collection(&self, scope: &CollectionScope) -> Result<Vec<RemoteItem>, CoreError>;
}
