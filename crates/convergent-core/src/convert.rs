// ── Wire type conversions ──
//
// convergent-api speaks strings and JSON; the core speaks keys, statuses
// and handles. Everything crossing that boundary goes through here.

use convergent_api::types::{ItemResponse, KeyPartValue, MutationBody, OperationResponse};

use crate::gateway::MutationRequest;
use crate::model::{
    BusinessKey, KeyPart, OperationHandle, RemoteItem, StatusReport, Submission, SurrogateId,
};

impl From<KeyPartValue> for KeyPart {
    fn from(v: KeyPartValue) -> Self {
        match v {
            KeyPartValue::Int(n) => Self::Int(n),
            KeyPartValue::Text(s) => Self::Text(s),
        }
    }
}

impl From<KeyPart> for KeyPartValue {
    fn from(p: KeyPart) -> Self {
        match p {
            KeyPart::Int(n) => Self::Int(n),
            KeyPart::Text(s) => Self::Text(s),
        }
    }
}

impl From<ItemResponse> for RemoteItem {
    fn from(r: ItemResponse) -> Self {
        Self {
            key: BusinessKey::new(r.key),
            id: r.id.map(SurrogateId::from),
            attributes: r.attributes,
        }
    }
}

impl From<OperationResponse> for StatusReport {
    fn from(r: OperationResponse) -> Self {
        Self {
            status: r.status.into(),
            message: r.message,
            resource_id: r.resource_id.map(SurrogateId::from),
        }
    }
}

impl From<OperationResponse> for Submission {
    fn from(r: OperationResponse) -> Self {
        let handle = OperationHandle::new(r.id.clone());
        Self {
            handle,
            initial: r.into(),
        }
    }
}

impl From<&MutationRequest> for MutationBody {
    fn from(req: &MutationRequest) -> Self {
        Self {
            kind: req.kind.to_string(),
            target: req.target.as_ref().map(|id| id.as_str().to_owned()),
            payload: req.payload.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{CollectionScope, OperationKind};

    #[test]
    fn item_response_keeps_key_types() {
        let item = RemoteItem::from(ItemResponse {
            key: vec![KeyPartValue::Int(3131)],
            id: None,
            attributes: serde_json::Map::new(),
        });
        assert_eq!(item.key, BusinessKey::from(3131_i64));
        assert!(item.id.is_none());
    }

    #[test]
    fn operation_response_becomes_submission() {
        let sub = Submission::from(OperationResponse {
            id: "9107".into(),
            status: "received".into(),
            message: None,
            resource_id: None,
        });
        assert_eq!(sub.handle.as_str(), "9107");
        assert_eq!(sub.initial.status.as_str(), "RECEIVED");
    }

    #[test]
    fn mutation_request_body() {
        let body = MutationBody::from(&MutationRequest {
            scope: CollectionScope::new("appsec/1"),
            kind: OperationKind::Deactivate,
            target: Some(SurrogateId::new("act_9")),
            payload: json!({ "network": "STAGING" }),
        });
        assert_eq!(body.kind, "DEACTIVATE");
        assert_eq!(body.target.as_deref(), Some("act_9"));
    }
}
