// ── Collection members ──
//
// The untyped shape every collection member takes on its way through the
// core. Typed resources (AS assignments, edge hostnames) convert to and
// from this representation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::key::{BusinessKey, Keyed, SurrogateId};

/// Path of a remote collection, e.g. `gtm/example.akadns.net/asmaps/map1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionScope(String);

impl CollectionScope {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollectionScope {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for CollectionScope {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One member of a remote collection, declared or observed.
///
/// When used as a declared item the attributes are the user's intent;
/// when observed they are the service's authoritative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    pub key: BusinessKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SurrogateId>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RemoteItem {
    pub fn new(key: impl Into<BusinessKey>) -> Self {
        Self {
            key: key.into(),
            id: None,
            attributes: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<SurrogateId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

impl Keyed for RemoteItem {
    type Key = BusinessKey;

    fn business_key(&self) -> BusinessKey {
        self.key.clone()
    }

    /// Members without a service-assigned id are identified by their key.
    fn surrogate_id(&self) -> Option<SurrogateId> {
        Some(
            self.id
                .clone()
                .unwrap_or_else(|| SurrogateId::new(self.key.to_string())),
        )
    }
}
