use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::id::{AddressbookId, ContactId, OrgId};

/// Name of the implicit addressbook that holds every contact and org.
pub const ALL_ADDRESSBOOK_NAME: &str = "all";

/// A named grouping of contacts and organizations.
///
/// An addressbook does not own its members: `contact_ids` and `org_ids`
/// are ordered reference lists into the contact and org stores.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Addressbook {
    pub id: AddressbookId,
    pub name: String,
    #[serde(flatten)]
    pub audit: Audit,
    pub contact_ids: Vec<ContactId>,
    pub org_ids: Vec<OrgId>,
}

impl Addressbook {
    /// An unsaved addressbook with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns `true` if `name` is the reserved name of the implicit
    /// addressbook. Comparison ignores surrounding whitespace and ASCII case.
    pub fn is_reserved_name(name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(ALL_ADDRESSBOOK_NAME)
    }

    pub fn has_reserved_name(&self) -> bool {
        Self::is_reserved_name(&self.name)
    }

    pub fn member_count(&self) -> usize {
        self.contact_ids.len() + self.org_ids.len()
    }
}
