use serde::{Deserialize, Serialize};

use abook_types::{Address, Addressbook, Contact, Org};

/// One addressbook with its members nested inside it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressbookDocument {
    pub model: Addressbook,
    #[serde(default)]
    pub contacts: Vec<MemberDocument<Contact>>,
    #[serde(default)]
    pub orgs: Vec<MemberDocument<Org>>,
}

/// A contact or org together with the addresses it owns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDocument<M> {
    pub model: M,
    #[serde(default)]
    pub addresses: Vec<Address>,
}

impl AddressbookDocument {
    pub fn new(model: Addressbook) -> Self {
        Self {
            model,
            contacts: Vec::new(),
            orgs: Vec::new(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.contacts.len() + self.orgs.len()
    }
}

impl<M> MemberDocument<M> {
    pub fn new(model: M, addresses: Vec<Address>) -> Self {
        Self { model, addresses }
    }
}
