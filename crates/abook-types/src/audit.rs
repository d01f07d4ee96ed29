use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::principal::Principal;

/// Creation and modification metadata carried by every entity.
///
/// Creation fields are written once by the registry. Client payloads may
/// carry them (read-modify-write round trips do), but the registry never
/// copies them onto a stored entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_by: String,
}

impl Audit {
    /// Fresh metadata: created and modified now by `principal`.
    pub fn stamped(principal: &Principal) -> Self {
        let at = Utc::now();
        Self {
            created_at: at,
            created_by: principal.to_string(),
            modified_at: at,
            modified_by: principal.to_string(),
        }
    }

    /// Refresh the modification fields.
    pub fn touch(&mut self, principal: &Principal) {
        self.modified_at = Utc::now();
        self.modified_by = principal.to_string();
    }

    /// Returns `true` if `submitted` carries creation fields that disagree
    /// with this (stored) metadata. Unset submitted fields never disagree.
    pub fn creation_differs(&self, submitted: &Audit) -> bool {
        let by_differs =
            !submitted.created_by.is_empty() && submitted.created_by != self.created_by;
        let at_differs = submitted.created_at != DateTime::<Utc>::default()
            && submitted.created_at != self.created_at;
        by_differs || at_differs
    }
}
