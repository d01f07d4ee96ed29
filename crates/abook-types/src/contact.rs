use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::id::{AddressId, AddressbookId, ContactId};

/// A person, shared across any number of addressbooks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Derived from first and last name; never taken from client input.
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maiden_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
    /// Every addressbook this contact belongs to, including "all".
    pub memberships: Vec<AddressbookId>,
    pub address_ids: Vec<AddressId>,
}

impl Contact {
    /// An unsaved contact with the given name parts.
    pub fn named(first_name: Option<&str>, last_name: Option<&str>) -> Self {
        Self {
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
            ..Default::default()
        }
    }

    /// `"first last"` when both are present, else whichever is present.
    /// Blank parts count as absent.
    pub fn compose_full_name(&self) -> Option<String> {
        let first = non_blank(&self.first_name);
        let last = non_blank(&self.last_name);
        match (first, last) {
            (Some(f), Some(l)) => Some(format!("{f} {l}")),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(l)) => Some(l.to_string()),
            (None, None) => None,
        }
    }

    /// Copy name parts and profile fields from `input`. Identity, audit,
    /// membership, and address references are left untouched.
    pub fn copy_mutable_fields(&mut self, input: &Contact) {
        self.first_name = input.first_name.clone();
        self.last_name = input.last_name.clone();
        self.nick_name = input.nick_name.clone();
        self.maiden_name = input.maiden_name.clone();
        self.prefix = input.prefix.clone();
        self.suffix = input.suffix.clone();
        self.company = input.company.clone();
        self.department = input.department.clone();
        self.job_title = input.job_title.clone();
        self.birthday = input.birthday.clone();
        self.photo_url = input.photo_url.clone();
        self.note = input.note.clone();
    }

    /// Key used for the default list ordering.
    pub fn sort_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or("")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
