// Wire types for the remote configuration service.
//
// These mirror the JSON the service sends and receives. Domain types
// live in `convergent-core`; conversion happens there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One element of a business key as it appears on the wire.
///
/// Keys are ordered tuples of integers and strings, e.g. `[3131]` for a
/// datacenter or `["www.example.com", "edgesuite.net"]` for a hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPartValue {
    Int(i64),
    Text(String),
}

/// A collection member returned by `GET /scopes/{scope}/items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub key: Vec<KeyPartValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Envelope for collection reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<ItemResponse>,
}

/// Body for `POST /scopes/{scope}/mutations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationBody {
    /// `ACTIVATE`, `DEACTIVATE`, or `UPDATE`.
    pub kind: String,
    /// Surrogate id of the object being changed, when one is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub payload: Value,
}

/// Status document for an accepted mutation.
///
/// Returned both by the submission endpoint and by
/// `GET /operations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Surrogate id of the object the operation created or touched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

/// Problem document returned alongside 4xx/5xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        self.detail.or(self.message).or(self.title)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_parts_accept_mixed_types() {
        let item: ItemResponse = serde_json::from_value(json!({
            "key": ["www.example.com", "edgesuite.net"],
            "id": "ehn_1",
            "attributes": { "secureNetwork": "STANDARD_TLS" }
        }))
        .unwrap();
        assert_eq!(
            item.key,
            vec![
                KeyPartValue::Text("www.example.com".into()),
                KeyPartValue::Text("edgesuite.net".into())
            ]
        );

        let dc: ItemResponse = serde_json::from_value(json!({ "key": [3131] })).unwrap();
        assert_eq!(dc.key, vec![KeyPartValue::Int(3131)]);
        assert!(dc.id.is_none());
        assert!(dc.attributes.is_empty());
    }

    #[test]
    fn mutation_body_omits_unknown_target() {
        let body = MutationBody {
            kind: "ACTIVATE".into(),
            target: None,
            payload: json!({ "configId": 1 }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("target").is_none());
    }

    #[test]
    fn error_body_prefers_detail() {
        let body: ErrorBody = serde_json::from_value(json!({
            "title": "Bad Request",
            "detail": "Default Datacenter 5400 does not exist"
        }))
        .unwrap();
        assert_eq!(
            body.into_message().as_deref(),
            Some("Default Datacenter 5400 does not exist")
        );
    }
}
