// ── Edge hostname bindings ──
//
// An edge hostname is identified by its (prefix, suffix) pair. The suffix
// also decides the secure-network class. The service has no delete for
// these; removing one only forgets it locally.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString};

use super::desired::DesiredState;
use super::item::{CollectionScope, RemoteItem};
use super::key::{BusinessKey, KeyPart, Keyed, SurrogateId};
use super::operation::{OperationKind, TerminalStatuses};
use crate::error::CoreError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SecureNetwork {
    StandardTls,
    EnhancedTls,
    SharedCert,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IpBehavior {
    Ipv4,
    Ipv6,
    /// Dual stack.
    Ipv6Compliance,
}

impl IpBehavior {
    pub fn from_flags(ipv4: bool, ipv6: bool) -> Result<Self, CoreError> {
        match (ipv4, ipv6) {
            (true, true) => Ok(Self::Ipv6Compliance),
            (true, false) => Ok(Self::Ipv4),
            (false, true) => Ok(Self::Ipv6),
            (false, false) => Err(CoreError::validation(
                "ipv4 or ipv6 must be specified to create a new edge hostname",
            )),
        }
    }
}

const SUFFIXES: [(&str, SecureNetwork); 3] = [
    ("edgesuite.net", SecureNetwork::StandardTls),
    ("edgekey.net", SecureNetwork::EnhancedTls),
    ("akamaized.net", SecureNetwork::SharedCert),
];

/// One edge hostname, declared or observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeHostname {
    pub prefix: String,
    pub suffix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SurrogateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure_network: Option<SecureNetwork>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_behavior: Option<IpBehavior>,
    /// Certificate enrollment id; required for enhanced TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<i64>,
}

impl EdgeHostname {
    /// Split a full hostname into prefix and suffix.
    ///
    /// Known suffixes also fix the secure network. Anything else keeps the
    /// whole name as prefix under `edgesuite.net` (or `edgekey.net` when
    /// the name ends in it without a separating dot).
    pub fn parse(hostname: &str) -> Result<Self, CoreError> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(CoreError::validation("edge hostname must not be empty"));
        }

        for (suffix, network) in SUFFIXES {
            if let Some(prefix) = hostname.strip_suffix(&format!(".{suffix}")) {
                return Ok(Self::bare(prefix, suffix, Some(network)));
            }
        }

        let suffix = if hostname.ends_with("edgekey.net") {
            "edgekey.net"
        } else {
            "edgesuite.net"
        };
        Ok(Self::bare(hostname, suffix, None))
    }

    fn bare(prefix: &str, suffix: &str, secure_network: Option<SecureNetwork>) -> Self {
        Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
            id: None,
            secure_network,
            ip_behavior: None,
            certificate: None,
        }
    }

    #[must_use]
    pub fn with_ip_behavior(mut self, behavior: IpBehavior) -> Self {
        self.ip_behavior = Some(behavior);
        self
    }

    #[must_use]
    pub fn with_certificate(mut self, enrollment_id: i64) -> Self {
        self.certificate = Some(enrollment_id);
        self
    }

    pub fn hostname(&self) -> String {
        format!("{}.{}", self.prefix, self.suffix)
    }

    /// Check the fields a creation request needs.
    pub fn validate_for_create(&self) -> Result<(), CoreError> {
        if self.ip_behavior.is_none() {
            return Err(CoreError::validation(
                "ipv4 or ipv6 must be specified to create a new edge hostname",
            ));
        }
        if self.secure_network == Some(SecureNetwork::EnhancedTls) && self.certificate.is_none() {
            return Err(CoreError::validation(
                "a certificate enrollment id is required for enhanced TLS (edgekey.net) edge hostnames",
            ));
        }
        Ok(())
    }

    /// Create-if-absent request for this hostname in `scope`.
    ///
    /// An existing hostname with the same prefix and suffix is reused.
    pub fn desired_state(&self, scope: CollectionScope) -> Result<DesiredState, CoreError> {
        self.validate_for_create()?;
        let item = RemoteItem::from(self);
        Ok(DesiredState::new(scope, OperationKind::Activate)
            .with_identity(self.business_key())
            .with_payload(Value::Object(item.attributes.clone()))
            .with_declared(vec![item])
            .with_terminal(TerminalStatuses::provisioning()))
    }
}

impl Keyed for EdgeHostname {
    type Key = BusinessKey;

    fn business_key(&self) -> BusinessKey {
        BusinessKey::new([self.prefix.as_str(), self.suffix.as_str()])
    }

    fn surrogate_id(&self) -> Option<SurrogateId> {
        self.id.clone()
    }
}

impl From<&EdgeHostname> for RemoteItem {
    fn from(h: &EdgeHostname) -> Self {
        let mut item = Self::new(h.business_key())
            .with_attribute("domainPrefix", h.prefix.clone())
            .with_attribute("domainSuffix", h.suffix.clone());
        item.id.clone_from(&h.id);
        if let Some(network) = h.secure_network {
            item = item.with_attribute("secureNetwork", network.to_string());
        }
        if let Some(behavior) = h.ip_behavior {
            item = item.with_attribute("ipVersionBehavior", behavior.to_string());
        }
        if let Some(cert) = h.certificate {
            item = item.with_attribute("certEnrollmentId", json!(cert));
        }
        item
    }
}

impl TryFrom<RemoteItem> for EdgeHostname {
    type Error = CoreError;

    fn try_from(item: RemoteItem) -> Result<Self, Self::Error> {
        let (prefix, suffix) = match item.key.parts() {
            [KeyPart::Text(p), KeyPart::Text(s)] => (p.clone(), s.clone()),
            _ => {
                return Err(CoreError::validation(format!(
                    "edge hostname key must be (prefix, suffix), got {}",
                    item.key
                )));
            }
        };
        Ok(Self {
            prefix,
            suffix,
            id: item.id.clone(),
            secure_network: text_attribute(&item, "secureNetwork").and_then(|s| s.parse().ok()),
            ip_behavior: text_attribute(&item, "ipVersionBehavior").and_then(|s| s.parse().ok()),
            certificate: item.attribute("certEnrollmentId").and_then(Value::as_i64),
        })
    }
}

fn text_attribute<'a>(item: &'a RemoteItem, name: &str) -> Option<&'a str> {
    item.attribute(name).and_then(Value::as_str)
}
