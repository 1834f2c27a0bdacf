// ── Mutation orchestration ──
//
// One resource-lifecycle operation end to end: resolve identity, submit,
// poll to a terminal status, then read the collection back and reconcile
// it against what the caller declared.
//
// Identity is only known after creation, so it is resolved twice: once to
// choose between create, reuse and update, and again after convergence to
// confirm what the service actually holds.

use std::sync::Arc;

use serde::Serialize;
use tracing::{Instrument, debug, info, info_span};

use crate::config::MutationOptions;
use crate::error::{CoreError, OperationContext};
use crate::gateway::{MutationRequest, RemoteGateway};
use crate::identity::{Resolution, resolve_identity};
use crate::model::{
    ConvergenceOperation, DesiredState, OperationKind, Phase, RemoteItem, StatusReport, SurrogateId,
    TerminalStatuses,
};
use crate::poller::{Poller, TerminalOutcome};

/// What [`MutationOrchestrator::perform_mutation`] achieved.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The desired state was disabled; nothing was sent.
    Skipped,
    /// The object already existed; no mutation was submitted.
    Reused {
        id: SurrogateId,
        items: Vec<RemoteItem>,
    },
    /// Submitted without waiting. Remote state is unconfirmed.
    Accepted { operation: ConvergenceOperation },
    /// Reached a success status and the collection was read back.
    Converged {
        id: Option<SurrogateId>,
        report: StatusReport,
        items: Vec<RemoteItem>,
    },
    /// Deactivation target does not exist remotely.
    AlreadyAbsent,
}

/// What to do after identity resolution.
#[derive(Debug)]
enum Plan {
    Reuse {
        id: SurrogateId,
        observed: Vec<RemoteItem>,
    },
    Submit {
        kind: OperationKind,
        target: Option<SurrogateId>,
    },
    AlreadyAbsent,
}

/// Drives mutations against an explicitly injected gateway.
pub struct MutationOrchestrator<G: ?Sized> {
    gateway: Arc<G>,
}

impl<G: ?Sized> Clone for MutationOrchestrator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<G> MutationOrchestrator<G>
where
    G: RemoteGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolve, submit, wait, and reconcile one desired state.
    ///
    /// Remote errors come back with the operation kind (and handle, once
    /// known) attached. A failure status becomes `RemoteRejected` carrying
    /// the service's reason verbatim.
    pub async fn perform_mutation(
        &self,
        desired: &DesiredState,
        options: &MutationOptions,
    ) -> Result<MutationOutcome, CoreError> {
        let span = info_span!(
            "perform_mutation",
            scope = %desired.scope,
            kind = %desired.kind,
        );
        self.perform(desired, options).instrument(span).await
    }

    async fn perform(
        &self,
        desired: &DesiredState,
        options: &MutationOptions,
    ) -> Result<MutationOutcome, CoreError> {
        if !desired.enabled {
            info!("desired state is disabled, nothing to submit");
            return Ok(MutationOutcome::Skipped);
        }

        let (kind, target) = match self.plan(desired).await? {
            Plan::Reuse { id, observed } => {
                info!(%id, "object already exists, reusing");
                let items = desired.reconcile_observed(&observed);
                return Ok(MutationOutcome::Reused { id, items });
            }
            Plan::AlreadyAbsent => {
                info!("deactivation target does not exist");
                return Ok(MutationOutcome::AlreadyAbsent);
            }
            Plan::Submit { kind, target } => (kind, target),
        };

        let context = OperationContext::new(kind);
        let request = MutationRequest {
            scope: desired.scope.clone(),
            kind,
            target: target.clone(),
            payload: desired.payload.clone(),
        };
        let submission = self
            .gateway
            .submit_mutation(&request)
            .await
            .map_err(|e| e.with_context(&context))?;
        let context = context.with_handle(submission.handle.clone());
        info!(
            handle = %submission.handle,
            status = %submission.initial.status,
            "mutation accepted"
        );

        let terminal = desired
            .terminal
            .clone()
            .unwrap_or_else(|| TerminalStatuses::activation(kind));
        let operation = ConvergenceOperation::new(kind, submission, terminal);

        // Some services reject at submission time with a failure status.
        if operation.current_phase() == Phase::Failed {
            return Err(CoreError::RemoteRejected {
                message: operation.report.explanation(),
                context: Some(context),
            });
        }
        if !options.wait_for_convergence {
            return Ok(MutationOutcome::Accepted { operation });
        }

        let outcome = Poller::new(self.gateway.as_ref(), options.poll)
            .with_cancellation(options.cancellation.clone().unwrap_or_default())
            .with_deadline(options.deadline)
            .run(operation)
            .await?;
        let report = match outcome {
            TerminalOutcome::Succeeded(report) => report,
            TerminalOutcome::Failed(report) => {
                return Err(CoreError::RemoteRejected {
                    message: report.explanation(),
                    context: Some(context),
                });
            }
        };

        let observed = match self.gateway.fetch_collection(&desired.scope).await {
            Ok(items) => items,
            Err(e) if e.is_not_found() && kind == OperationKind::Deactivate => Vec::new(),
            Err(e) => return Err(e.with_context(&context)),
        };
        let id = confirm_identity(desired, kind, target, &report, &observed)
            .map_err(|e| e.with_context(&context))?;
        let items = desired.reconcile_observed(&observed);
        info!(status = %report.status, items = items.len(), "mutation converged");

        Ok(MutationOutcome::Converged { id, report, items })
    }

    async fn plan(&self, desired: &DesiredState) -> Result<Plan, CoreError> {
        let Some(key) = &desired.identity else {
            return Ok(Plan::Submit {
                kind: desired.kind,
                target: None,
            });
        };

        // A collection that does not exist yet holds nothing to match.
        let observed = match self.gateway.fetch_collection(&desired.scope).await {
            Ok(items) => items,
            Err(e) if e.is_not_found() => {
                debug!(scope = %desired.scope, "collection not found, treating as empty");
                Vec::new()
            }
            Err(e) => return Err(e.with_context(&OperationContext::new(desired.kind))),
        };

        let resolution = resolve_identity(key, &observed);
        debug!(%key, ?resolution, "resolved identity");

        Ok(match (desired.kind, resolution) {
            (OperationKind::Activate, Resolution::Found(id)) => {
                let satisfied = observed
                    .iter()
                    .rev()
                    .find(|item| &item.key == key && item.id.as_ref() == Some(&id))
                    .is_some_and(|item| desired.is_satisfied_by(item));
                if satisfied {
                    Plan::Reuse { id, observed }
                } else {
                    debug!(%id, "existing object is not in a success state, resubmitting");
                    Plan::Submit {
                        kind: OperationKind::Activate,
                        target: None,
                    }
                }
            }
            (OperationKind::Activate | OperationKind::Update, Resolution::NotFound) => {
                Plan::Submit {
                    kind: OperationKind::Activate,
                    target: None,
                }
            }
            (kind, Resolution::Found(id)) => Plan::Submit {
                kind,
                target: Some(id),
            },
            (OperationKind::Deactivate, Resolution::NotFound) => Plan::AlreadyAbsent,
        })
    }
}

/// Second identity pass, after convergence.
fn confirm_identity(
    desired: &DesiredState,
    kind: OperationKind,
    target: Option<SurrogateId>,
    report: &StatusReport,
    observed: &[RemoteItem],
) -> Result<Option<SurrogateId>, CoreError> {
    if kind == OperationKind::Deactivate {
        return Ok(target.or_else(|| report.resource_id.clone()));
    }
    let Some(key) = &desired.identity else {
        return Ok(report.resource_id.clone().or(target));
    };
    match resolve_identity(key, observed) {
        Resolution::Found(id) => Ok(Some(id)),
        Resolution::NotFound => report.resource_id.clone().map(Some).ok_or_else(|| {
            CoreError::not_found(format!(
                "{key} in {} after the operation converged",
                desired.scope
            ))
        }),
    }
}
