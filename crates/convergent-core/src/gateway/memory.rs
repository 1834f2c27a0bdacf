//! In-memory gateway with scripted responses.
//!
//! Drives the poller and orchestrator without a network. Each collection is
//! a queue of snapshots: a read returns the front snapshot and advances
//! while more than one remains, so the last snapshot repeats. Status replies
//! are scripted per handle and consumed one per fetch.
//!
//! Not for production: nothing is shared across processes and the service's
//! own state machine is not modelled.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{MutationRequest, RemoteGateway, StatusFetcher};
use crate::error::CoreError;
use crate::model::{CollectionScope, OperationHandle, RemoteItem, StatusReport, Submission};

#[derive(Debug, Default)]
struct State {
    collections: HashMap<CollectionScope, VecDeque<Vec<RemoteItem>>>,
    statuses: HashMap<OperationHandle, VecDeque<Result<StatusReport, CoreError>>>,
    submissions: VecDeque<Result<Submission, CoreError>>,
    submitted: Vec<MutationRequest>,
    status_fetches: usize,
    collection_fetches: usize,
    next_handle: u64,
}

/// Scripted stand-in for the remote service.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a snapshot of `scope`.
    pub fn push_collection(&self, scope: impl Into<CollectionScope>, items: Vec<RemoteItem>) {
        self.lock()
            .collections
            .entry(scope.into())
            .or_default()
            .push_back(items);
    }

    /// Queue status replies for `handle`, one per fetch.
    pub fn script_statuses<I>(&self, handle: &OperationHandle, reports: I)
    where
        I: IntoIterator<Item = StatusReport>,
    {
        self.lock()
            .statuses
            .entry(handle.clone())
            .or_default()
            .extend(reports.into_iter().map(Ok));
    }

    /// Queue a failed status fetch for `handle`.
    pub fn script_status_error(&self, handle: &OperationHandle, err: CoreError) {
        self.lock()
            .statuses
            .entry(handle.clone())
            .or_default()
            .push_back(Err(err));
    }

    /// Answer the next submission with `outcome` instead of the default
    /// `op-N` / `PENDING` acceptance.
    pub fn script_submission(&self, outcome: Result<Submission, CoreError>) {
        self.lock().submissions.push_back(outcome);
    }

    /// Every mutation submitted so far, in order.
    pub fn submitted(&self) -> Vec<MutationRequest> {
        self.lock().submitted.clone()
    }

    pub fn status_fetches(&self) -> usize {
        self.lock().status_fetches
    }

    pub fn collection_fetches(&self) -> usize {
        self.lock().collection_fetches
    }
}

#[async_trait]
impl StatusFetcher for InMemoryGateway {
    async fn fetch_status(&self, handle: &OperationHandle) -> Result<StatusReport, CoreError> {
        let mut state = self.lock();
        state.status_fetches += 1;
        state
            .statuses
            .get_mut(handle)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(CoreError::not_found(format!("operation {handle}"))))
    }
}

#[async_trait]
impl RemoteGateway for InMemoryGateway {
    async fn submit_mutation(&self, request: &MutationRequest) -> Result<Submission, CoreError> {
        let mut state = self.lock();
        state.submitted.push(request.clone());
        if let Some(scripted) = state.submissions.pop_front() {
            return scripted;
        }
        state.next_handle += 1;
        Ok(Submission {
            handle: OperationHandle::new(format!("op-{}", state.next_handle)),
            initial: StatusReport::new("PENDING"),
        })
    }

    async fn fetch_collection(&self, scope: &CollectionScope) -> Result<Vec<RemoteItem>, CoreError> {
        let mut state = self.lock();
        state.collection_fetches += 1;
        let Some(snapshots) = state.collections.get_mut(scope) else {
            return Err(CoreError::not_found(format!("collection {scope}")));
        };
        if snapshots.len() > 1 {
            Ok(snapshots.pop_front().unwrap_or_default())
        } else {
            Ok(snapshots.front().cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::OperationKind;

    #[tokio::test]
    async fn last_snapshot_repeats() {
        let gw = InMemoryGateway::new();
        gw.push_collection("s", vec![]);
        gw.push_collection("s", vec![RemoteItem::new(1_i64)]);

        let scope = CollectionScope::new("s");
        assert!(gw.fetch_collection(&scope).await.unwrap().is_empty());
        assert_eq!(gw.fetch_collection(&scope).await.unwrap().len(), 1);
        assert_eq!(gw.fetch_collection(&scope).await.unwrap().len(), 1);
        assert_eq!(gw.collection_fetches(), 3);
    }

    #[tokio::test]
    async fn unknown_scope_is_not_found() {
        let gw = InMemoryGateway::new();
        let err = gw
            .fetch_collection(&CollectionScope::new("nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn default_submission_numbers_handles() {
        let gw = InMemoryGateway::new();
        let req = MutationRequest {
            scope: CollectionScope::new("s"),
            kind: OperationKind::Activate,
            target: None,
            payload: serde_json::Value::Null,
        };
        let a = gw.submit_mutation(&req).await.unwrap();
        let b = gw.submit_mutation(&req).await.unwrap();
        assert_eq!(a.handle.as_str(), "op-1");
        assert_eq!(b.handle.as_str(), "op-2");
        assert_eq!(gw.submitted().len(), 2);
    }
}
