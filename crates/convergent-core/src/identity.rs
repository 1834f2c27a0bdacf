// ── Identity resolution ──
//
// Maps a declared business key onto the surrogate id the remote service
// assigned, so a repeated create finds the object it already made.

use serde::Serialize;

use crate::model::{Keyed, SurrogateId};

/// Outcome of looking a business key up in an observed collection.
///
/// "Not found" is an ordinary answer here, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "resolution", content = "id", rename_all = "snake_case")]
pub enum Resolution {
    Found(SurrogateId),
    NotFound,
}

impl Resolution {
    pub fn found(self) -> Option<SurrogateId> {
        match self {
            Self::Found(id) => Some(id),
            Self::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Find the surrogate id of the observed item whose business key equals
/// `key` exactly.
///
/// If the service returns the same key twice, the later entry wins, the
/// same one [`reconcile`](crate::reconcile) keeps. Matches that carry no
/// surrogate id are skipped.
pub fn resolve_identity<O: Keyed>(key: &O::Key, observed: &[O]) -> Resolution {
    observed
        .iter()
        .rev()
        .filter(|item| item.business_key() == *key)
        .find_map(Keyed::surrogate_id)
        .map_or(Resolution::NotFound, Resolution::Found)
}
