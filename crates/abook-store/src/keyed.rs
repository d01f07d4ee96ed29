use std::fmt;
use std::hash::Hash;

use abook_types::{Address, AddressId, Addressbook, AddressbookId, Contact, ContactId, Org, OrgId};

/// An entity that can be stored by its own identifier.
pub trait Keyed: Clone + Send + Sync + 'static {
    type Key: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Human-readable entity kind, used in errors and logs.
    const KIND: &'static str;

    fn key(&self) -> &Self::Key;
}

impl Keyed for Addressbook {
    type Key = AddressbookId;
    const KIND: &'static str = "addressbook";

    fn key(&self) -> &AddressbookId {
        &self.id
    }
}

impl Keyed for Contact {
    type Key = ContactId;
    const KIND: &'static str = "contact";

    fn key(&self) -> &ContactId {
        &self.id
    }
}

impl Keyed for Org {
    type Key = OrgId;
    const KIND: &'static str = "org";

    fn key(&self) -> &OrgId {
        &self.id
    }
}

impl Keyed for Address {
    type Key = AddressId;
    const KIND: &'static str = "address";

    fn key(&self) -> &AddressId {
        &self.id
    }
}
