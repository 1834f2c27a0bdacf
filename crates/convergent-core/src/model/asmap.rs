// ── Traffic-steering AS maps ──
//
// An AS map routes autonomous-system numbers to datacenters. Each
// assignment is keyed by datacenter id; its AS numbers are a nested list
// reconciled the same way, value by value.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::desired::DesiredState;
use super::item::{CollectionScope, RemoteItem};
use super::key::{KeyPart, Keyed, SurrogateId};
use super::operation::{OperationKind, TerminalStatuses};
use crate::error::CoreError;

/// The service's built-in default datacenter; created on demand.
pub const MAP_DEFAULT_DATACENTER_ID: i64 = 5400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsAssignment {
    pub datacenter_id: i64,
    pub nickname: String,
    #[serde(default)]
    pub as_numbers: Vec<i64>,
}

impl Keyed for AsAssignment {
    type Key = i64;

    fn business_key(&self) -> i64 {
        self.datacenter_id
    }

    fn surrogate_id(&self) -> Option<SurrogateId> {
        Some(SurrogateId::new(self.datacenter_id.to_string()))
    }
}

impl From<&AsAssignment> for RemoteItem {
    fn from(a: &AsAssignment) -> Self {
        Self::new(a.datacenter_id)
            .with_attribute("nickname", a.nickname.clone())
            .with_attribute("asNumbers", json!(a.as_numbers))
    }
}

impl TryFrom<RemoteItem> for AsAssignment {
    type Error = CoreError;

    fn try_from(item: RemoteItem) -> Result<Self, Self::Error> {
        let [KeyPart::Int(datacenter_id)] = item.key.parts() else {
            return Err(CoreError::validation(format!(
                "AS assignment key must be a datacenter id, got {}",
                item.key
            )));
        };
        let nickname = item
            .attribute("nickname")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let as_numbers = match item.attribute("asNumbers") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| {
                    v.as_i64().ok_or_else(|| {
                        CoreError::validation(format!(
                            "datacenter {datacenter_id}: AS number {v} is not an integer"
                        ))
                    })
                })
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(CoreError::validation(format!(
                    "datacenter {datacenter_id}: asNumbers must be a list, got {other}"
                )));
            }
        };
        Ok(Self {
            datacenter_id: *datacenter_id,
            nickname,
            as_numbers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultDatacenter {
    pub datacenter_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl DefaultDatacenter {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.datacenter_id == 0 {
            return Err(CoreError::validation("default datacenter id invalid"));
        }
        Ok(())
    }
}

fn wait_default() -> bool {
    true
}

/// Declared AS map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsMapSpec {
    pub domain: String,
    pub name: String,
    pub default_datacenter: DefaultDatacenter,
    #[serde(default)]
    pub assignments: Vec<AsAssignment>,
    /// Wait for propagation to finish.
    #[serde(default = "wait_default")]
    pub wait_on_complete: bool,
}

impl AsMapSpec {
    pub fn scope(&self) -> CollectionScope {
        CollectionScope::new(format!("gtm/{}/asmaps/{}", self.domain, self.name))
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.domain.trim().is_empty() || self.name.trim().is_empty() {
            return Err(CoreError::validation("AS map domain and name are required"));
        }
        self.default_datacenter.validate()
    }

    /// Whole-map update, reconciled against the map's assignments.
    ///
    /// Updates create the map if it does not exist, so no identity is
    /// resolved beforehand.
    pub fn desired_state(&self) -> Result<DesiredState, CoreError> {
        self.validate()?;
        let declared: Vec<RemoteItem> = self.assignments.iter().map(RemoteItem::from).collect();
        let payload = json!({
            "name": self.name,
            "defaultDatacenter": {
                "datacenterId": self.default_datacenter.datacenter_id,
                "nickname": self.default_datacenter.nickname,
            },
            "assignments": self
                .assignments
                .iter()
                .map(|a| json!({
                    "datacenterId": a.datacenter_id,
                    "nickname": a.nickname,
                    "asNumbers": a.as_numbers,
                }))
                .collect::<Vec<_>>(),
        });
        Ok(DesiredState::new(self.scope(), OperationKind::Update)
            .with_payload(payload)
            .with_declared(declared)
            .with_nested_list("asNumbers")
            .with_terminal(TerminalStatuses::propagation()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::BusinessKey;

    fn assignment(dc: i64, nickname: &str, asns: &[i64]) -> AsAssignment {
        AsAssignment {
            datacenter_id: dc,
            nickname: nickname.into(),
            as_numbers: asns.to_vec(),
        }
    }

    fn spec(assignments: Vec<AsAssignment>) -> AsMapSpec {
        AsMapSpec {
            domain: "example.akadns.net".into(),
            name: "map1".into(),
            default_datacenter: DefaultDatacenter {
                datacenter_id: MAP_DEFAULT_DATACENTER_ID,
                nickname: None,
            },
            assignments,
            wait_on_complete: true,
        }
    }

    #[test]
    fn assignments_and_their_numbers_follow_declared_order() {
        let desired = spec(vec![
            assignment(3132, "west", &[16702, 12222]),
            assignment(3131, "east", &[17334]),
        ])
        .desired_state()
        .unwrap();
        let observed: Vec<RemoteItem> = [
            assignment(3131, "East DC", &[17334]),
            assignment(3133, "lab", &[64512]),
            assignment(3132, "West DC", &[12222, 16702, 20940]),
        ]
        .iter()
        .map(RemoteItem::from)
        .collect();

        let merged: Vec<AsAssignment> = desired
            .reconcile_observed(&observed)
            .into_iter()
            .map(|i| AsAssignment::try_from(i).unwrap())
            .collect();
        assert_eq!(
            merged,
            vec![
                assignment(3132, "West DC", &[16702, 12222, 20940]),
                assignment(3131, "East DC", &[17334]),
                assignment(3133, "lab", &[64512]),
            ]
        );
    }

    #[test]
    fn default_datacenter_zero_is_invalid() {
        let ddc = DefaultDatacenter {
            datacenter_id: 0,
            nickname: None,
        };
        assert!(ddc.validate().is_err());
        assert!(
            DefaultDatacenter {
                datacenter_id: MAP_DEFAULT_DATACENTER_ID,
                nickname: Some("Default Datacenter".into()),
            }
            .validate()
            .is_ok()
        );
    }

    #[test]
    fn remote_item_conversion() {
        let item = RemoteItem::new(3131_i64)
            .with_attribute("nickname", "east")
            .with_attribute("asNumbers", json!([17334, 12222]));
        let a = AsAssignment::try_from(item).unwrap();
        assert_eq!(a, assignment(3131, "east", &[17334, 12222]));

        let bad = RemoteItem::new(BusinessKey::new(["east"]));
        assert!(AsAssignment::try_from(bad).is_err());

        let bad_numbers = RemoteItem::new(1_i64).with_attribute("asNumbers", json!(["x"]));
        assert!(AsAssignment::try_from(bad_numbers).is_err());
    }

    #[test]
    fn desired_state_uses_propagation_vocabulary() {
        let spec: AsMapSpec = serde_json::from_value(json!({
            "domain": "example.akadns.net",
            "name": "map1",
            "default_datacenter": { "datacenter_id": 5400, "nickname": "Default" },
            "assignments": [
                { "datacenter_id": 3131, "nickname": "east", "as_numbers": [17334] }
            ]
        }))
        .unwrap();
        assert!(spec.wait_on_complete);

        let desired = spec.desired_state().unwrap();
        assert_eq!(desired.scope.as_str(), "gtm/example.akadns.net/asmaps/map1");
        assert_eq!(desired.kind, OperationKind::Update);
        assert_eq!(desired.terminal, Some(TerminalStatuses::propagation()));
        assert_eq!(desired.declared.len(), 1);
        assert_eq!(desired.nested_lists, vec!["asNumbers".to_owned()]);
        assert_eq!(desired.payload["defaultDatacenter"]["datacenterId"], 5400);
    }
}
