// ── Desired state ──
//
// What the caller wants one mutation to achieve: where, what kind, which
// object (by business key), the payload to send, and the ordered items the
// result should be reconciled against.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::{CollectionScope, RemoteItem};
use super::key::BusinessKey;
use super::operation::{OperationKind, Phase, Status, TerminalStatuses};
use crate::reconcile::{reconcile, reconcile_nested};

/// One resource-lifecycle request, already validated by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesiredState {
    /// Collection the object lives in.
    pub scope: CollectionScope,
    pub kind: OperationKind,
    /// Business key of the target object. Without one every request is
    /// submitted as-is with no target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<BusinessKey>,
    #[serde(default)]
    pub payload: Value,
    /// Items in the user's order, matched against the collection after
    /// convergence.
    #[serde(default)]
    pub declared: Vec<RemoteItem>,
    /// Status vocabulary; defaults to the activation vocabulary for `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalStatuses>,
    /// `false` turns the request into a no-op.
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// List attributes of each item whose values are reconciled too.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_lists: Vec<String>,
    /// Attribute holding an observed object's lifecycle status. When set,
    /// an existing object is only reused while that status is a success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_attribute: Option<String>,
}

fn enabled() -> bool {
    true
}

impl DesiredState {
    pub fn new(scope: CollectionScope, kind: OperationKind) -> Self {
        Self {
            scope,
            kind,
            identity: None,
            payload: Value::Null,
            declared: Vec::new(),
            terminal: None,
            enabled: true,
            nested_lists: Vec::new(),
            status_attribute: None,
        }
    }

    #[must_use]
    pub fn with_identity(mut self, key: BusinessKey) -> Self {
        self.identity = Some(key);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    #[must_use]
    pub fn with_declared(mut self, declared: Vec<RemoteItem>) -> Self {
        self.declared = declared;
        self
    }

    #[must_use]
    pub fn with_terminal(mut self, terminal: TerminalStatuses) -> Self {
        self.terminal = Some(terminal);
        self
    }

    #[must_use]
    pub fn with_nested_list(mut self, attribute: impl Into<String>) -> Self {
        self.nested_lists.push(attribute.into());
        self
    }

    #[must_use]
    pub fn with_status_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.status_attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn terminal_statuses(&self) -> TerminalStatuses {
        self.terminal
            .clone()
            .unwrap_or_else(|| TerminalStatuses::activation(self.kind))
    }

    /// Observed collection in declared order, nested lists included.
    pub fn reconcile_observed(&self, observed: &[RemoteItem]) -> Vec<RemoteItem> {
        let mut items = reconcile(&self.declared, observed);
        for attribute in &self.nested_lists {
            reconcile_nested(&self.declared, &mut items, attribute);
        }
        items
    }

    /// Whether an existing object already is what this request asks for.
    pub fn is_satisfied_by(&self, existing: &RemoteItem) -> bool {
        let Some(attribute) = &self.status_attribute else {
            return true;
        };
        existing
            .attribute(attribute)
            .and_then(serde_json::Value::as_str)
            .is_some_and(|status| {
                self.terminal_statuses().classify(&Status::from(status)) == Phase::Succeeded
            })
    }
}
