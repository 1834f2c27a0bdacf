// ── Security configuration activations ──

use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumString};

use super::desired::DesiredState;
use super::item::CollectionScope;
use super::key::{BusinessKey, KeyPart};
use super::operation::{OperationKind, TerminalStatuses};
use crate::error::CoreError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Network {
    #[default]
    Staging,
    Production,
}

fn default_notes() -> String {
    "Activation Notes".into()
}

fn default_activate() -> bool {
    true
}

/// Activate one version of a security configuration on a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub config_id: i64,
    pub version: i64,
    #[serde(default)]
    pub network: Network,
    #[serde(default = "default_notes")]
    pub notes: String,
    #[serde(default)]
    pub notification_emails: Vec<String>,
    /// `false` leaves the remote side untouched.
    #[serde(default = "default_activate")]
    pub activate: bool,
}

impl ActivationRequest {
    pub fn new(config_id: i64, version: i64) -> Self {
        Self {
            config_id,
            version,
            network: Network::default(),
            notes: default_notes(),
            notification_emails: Vec::new(),
            activate: true,
        }
    }

    pub fn scope(&self) -> CollectionScope {
        CollectionScope::new(format!("appsec/{}/activations", self.config_id))
    }

    /// Activations are identified by (version, network).
    pub fn business_key(&self) -> BusinessKey {
        BusinessKey::from(vec![
            KeyPart::Int(self.version),
            KeyPart::Text(self.network.to_string()),
        ])
    }

    /// Request for `kind`, which must be activate or deactivate.
    pub fn desired_state(&self, kind: OperationKind) -> Result<DesiredState, CoreError> {
        if kind == OperationKind::Update {
            return Err(CoreError::validation(
                "activations can only be activated or deactivated",
            ));
        }
        if self.version <= 0 {
            return Err(CoreError::validation(format!(
                "invalid configuration version {}",
                self.version
            )));
        }

        let desired = DesiredState::new(self.scope(), kind)
            .with_identity(self.business_key())
            .with_payload(json!({
                "action": kind.to_string(),
                "network": self.network.to_string(),
                "note": self.notes,
                "notificationEmails": self.notification_emails,
                "activationConfigs": [
                    { "configId": self.config_id, "configVersion": self.version }
                ],
            }))
            .with_terminal(TerminalStatuses::activation(kind))
            .with_status_attribute("status");

        Ok(if self.activate {
            desired
        } else {
            desired.disabled()
        })
    }
}
