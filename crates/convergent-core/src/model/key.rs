// ── Core identity types ──
//
// BusinessKey and SurrogateId form the foundation of every domain type.
// The business key is what the user declares; the surrogate id is what
// the remote service assigns once the object exists.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

// ── KeyPart ─────────────────────────────────────────────────────────

/// One attribute value inside a [`BusinessKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl FromStr for KeyPart {
    type Err = std::convert::Infallible;

    /// Integers parse as [`KeyPart::Int`], everything else as text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<i64>().map_or_else(|_| Self::from(s), Self::Int))
    }
}

// ── BusinessKey ─────────────────────────────────────────────────────

/// Ordered tuple of attribute values identifying a sub-object from the
/// user's point of view (a datacenter id, a hostname prefix + suffix).
///
/// Equality is exact on every part, in order. Keys are never regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessKey(Vec<KeyPart>);

impl BusinessKey {
    pub fn new(parts: impl IntoIterator<Item = impl Into<KeyPart>>) -> Self {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BusinessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl From<Vec<KeyPart>> for BusinessKey {
    fn from(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }
}

impl From<i64> for BusinessKey {
    fn from(n: i64) -> Self {
        Self(vec![KeyPart::Int(n)])
    }
}

// ── SurrogateId ─────────────────────────────────────────────────────

/// Opaque identifier assigned by the remote service once an object exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurrogateId(String);

impl SurrogateId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SurrogateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SurrogateId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SurrogateId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Keyed ───────────────────────────────────────────────────────────

/// Anything that can be matched by business key.
///
/// Implemented by declared and observed items alike; the reconciler and
/// the identity resolver only ever compare keys, never positions.
pub trait Keyed {
    type Key: Eq + Hash + Clone + fmt::Debug;

    fn business_key(&self) -> Self::Key;

    /// The remote identity of this item, when it has one.
    fn surrogate_id(&self) -> Option<SurrogateId> {
        None
    }
}
