use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use abook_snapshot::{AddressbookDocument, MemberDocument};
use abook_store::{AddressStore, AddressbookStore, ContactStore, EntityStore, OrgStore};
use abook_types::{
    Addressbook, AddressbookId, Audit, Contact, Org, Principal, ALL_ADDRESSBOOK_NAME,
};
use tracing::{debug, info, warn};

use crate::error::{expect_indexed, RegistryError, RegistryResult};
use crate::member::Member;
use crate::validation;

/// Entity counts across the registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub addressbooks: usize,
    pub contacts: usize,
    pub orgs: usize,
    pub addresses: usize,
}

/// The authoritative in-memory state: four id-keyed stores plus the
/// membership coordinator that keeps them consistent.
///
/// Every public operation takes the registry gate: exclusively for
/// mutations, shared for reads. Internal helpers never take it, so they
/// compose freely inside one operation.
pub struct Registry {
    pub(crate) addressbooks: AddressbookStore,
    pub(crate) contacts: ContactStore,
    pub(crate) orgs: OrgStore,
    pub(crate) addresses: AddressStore,
    all_id: AddressbookId,
    gate: RwLock<()>,
}

impl Registry {
    /// An empty registry holding only the implicit "all" addressbook.
    pub fn new(principal: &Principal) -> RegistryResult<Self> {
        Self::restore(Vec::new(), principal)
    }

    /// Rebuild a registry from snapshot documents.
    ///
    /// Membership sets are derived from the nesting: an entity appearing
    /// under several addressbooks becomes one entity with several
    /// memberships, and the first occurrence supplies its fields and
    /// addresses. The "all" addressbook is created if no document holds
    /// the reserved name, and every entity is made a member of it.
    pub fn restore(
        documents: Vec<AddressbookDocument>,
        principal: &Principal,
    ) -> RegistryResult<Self> {
        let reserved: Vec<&AddressbookId> = documents
            .iter()
            .filter(|doc| doc.model.has_reserved_name())
            .map(|doc| &doc.model.id)
            .collect();
        if reserved.len() > 1 {
            return Err(RegistryError::validation(format!(
                "{} addressbooks carry the reserved name '{ALL_ADDRESSBOOK_NAME}'",
                reserved.len()
            )));
        }
        let existing_all = reserved.first().map(|id| (*id).clone());

        let registry = Self {
            addressbooks: AddressbookStore::new(),
            contacts: ContactStore::new(),
            orgs: OrgStore::new(),
            addresses: AddressStore::new(),
            all_id: existing_all
                .clone()
                .unwrap_or_else(AddressbookId::generate),
            gate: RwLock::new(()),
        };

        if existing_all.is_none() {
            let all = Addressbook {
                id: registry.all_id.clone(),
                name: ALL_ADDRESSBOOK_NAME.to_string(),
                audit: Audit::stamped(principal),
                ..Default::default()
            };
            registry.addressbooks.put(all)?;
            info!(id = %registry.all_id, "created implicit addressbook '{ALL_ADDRESSBOOK_NAME}'");
        }

        for document in documents {
            registry.load_document(document)?;
        }

        let all_id = registry.all_id.clone();
        for id in registry.contacts.keys()? {
            registry.attach::<Contact>(&id, &all_id)?;
        }
        for id in registry.orgs.keys()? {
            registry.attach::<Org>(&id, &all_id)?;
        }

        let stats = registry.collect_stats()?;
        info!(
            addressbooks = stats.addressbooks,
            contacts = stats.contacts,
            orgs = stats.orgs,
            addresses = stats.addresses,
            "registry restored"
        );
        Ok(registry)
    }

    fn load_document(&self, document: AddressbookDocument) -> RegistryResult<()> {
        let AddressbookDocument {
            model,
            contacts,
            orgs,
        } = document;

        if model.id.is_unassigned() {
            return Err(RegistryError::validation(format!(
                "snapshot addressbook '{}' has no id",
                model.name
            )));
        }
        if self.addressbooks.contains(&model.id)? {
            return Err(RegistryError::duplicate("addressbook", &model.id));
        }

        let addressbook = Addressbook {
            contact_ids: Vec::new(),
            org_ids: Vec::new(),
            name: if model.has_reserved_name() {
                ALL_ADDRESSBOOK_NAME.to_string()
            } else {
                model.name.trim().to_string()
            },
            ..model
        };
        let id = addressbook.id.clone();
        self.addressbooks.put(addressbook)?;

        self.load_members(&id, contacts)?;
        self.load_members(&id, orgs)?;
        debug!(addressbook = %id, "snapshot document loaded");
        Ok(())
    }

    fn load_members<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        documents: Vec<MemberDocument<M>>,
    ) -> RegistryResult<()> {
        for MemberDocument { model, addresses } in documents {
            if !model.has_assigned_key() {
                return Err(RegistryError::validation(format!(
                    "snapshot {} in addressbook {addressbook_id} has no id",
                    M::KIND
                )));
            }
            let key = model.key().clone();

            if !M::store(self).contains(&key)? {
                let mut entity = model;
                entity.memberships_mut().clear();
                entity.address_ids_mut().clear();
                for address in addresses {
                    if address.id.is_unassigned() {
                        return Err(RegistryError::validation(format!(
                            "snapshot address of {} {key} has no id",
                            M::KIND
                        )));
                    }
                    if self.addresses.contains(&address.id)? {
                        return Err(RegistryError::validation(format!(
                            "address {} is owned by more than one entity",
                            address.id
                        )));
                    }
                    entity.address_ids_mut().push(address.id.clone());
                    self.addresses.put(address)?;
                }
                M::store(self).put(entity)?;
            }

            self.attach::<M>(&key, addressbook_id)?;
        }
        Ok(())
    }

    /// Export the whole registry as snapshot documents, one per
    /// addressbook with members and their addresses nested inline.
    pub fn to_documents(&self) -> RegistryResult<Vec<AddressbookDocument>> {
        let _gate = self.shared()?;
        let mut addressbooks = self.addressbooks.values()?;
        addressbooks.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        addressbooks
            .into_iter()
            .map(|addressbook| {
                let contacts = self.member_documents::<Contact>(&addressbook)?;
                let orgs = self.member_documents::<Org>(&addressbook)?;
                Ok(AddressbookDocument {
                    model: addressbook,
                    contacts,
                    orgs,
                })
            })
            .collect()
    }

    fn member_documents<M: Member>(
        &self,
        addressbook: &Addressbook,
    ) -> RegistryResult<Vec<MemberDocument<M>>> {
        M::member_ids(addressbook)
            .iter()
            .map(|id| {
                let entity = M::store(self)
                    .get(id)
                    .map_err(expect_indexed(format!("addressbook {} lists", addressbook.id)))?;
                let addresses = self
                    .addresses
                    .get_many(entity.address_ids())
                    .map_err(expect_indexed(format!("{} {id} references", M::KIND)))?;
                Ok(MemberDocument::new(entity, addresses))
            })
            .collect()
    }

    /// Id of the implicit "all" addressbook.
    pub fn all_addressbook_id(&self) -> &AddressbookId {
        &self.all_id
    }

    pub fn is_all(&self, id: &AddressbookId) -> bool {
        *id == self.all_id
    }

    pub fn stats(&self) -> RegistryResult<RegistryStats> {
        let _gate = self.shared()?;
        self.collect_stats()
    }

    fn collect_stats(&self) -> RegistryResult<RegistryStats> {
        Ok(RegistryStats {
            addressbooks: self.addressbooks.len()?,
            contacts: self.contacts.len()?,
            orgs: self.orgs.len()?,
            addresses: self.addresses.len()?,
        })
    }

    // ------------------------------------------------------------------
    // Addressbooks
    // ------------------------------------------------------------------

    pub fn list_addressbooks(&self) -> RegistryResult<Vec<Addressbook>> {
        let _gate = self.shared()?;
        Ok(self.addressbooks.values()?)
    }

    /// Create a custom addressbook. The id is always server-generated.
    pub fn create_addressbook(
        &self,
        input: Addressbook,
        principal: &Principal,
    ) -> RegistryResult<Addressbook> {
        if !input.id.is_unassigned() {
            return Err(RegistryError::validation(format!(
                "addressbook id {} is assigned by the server",
                input.id
            )));
        }
        let name = validation::addressbook_name(&input.name)?;

        let _gate = self.exclusive()?;
        self.ensure_unique_name(&name, None)?;
        let addressbook = Addressbook {
            id: AddressbookId::generate(),
            name,
            audit: Audit::stamped(principal),
            ..Default::default()
        };
        self.addressbooks.put(addressbook.clone())?;
        info!(id = %addressbook.id, name = %addressbook.name, %principal, "addressbook created");
        Ok(addressbook)
    }

    pub fn read_addressbook(&self, id: &AddressbookId) -> RegistryResult<Addressbook> {
        let _gate = self.shared()?;
        Ok(self.addressbooks.get(id)?)
    }

    /// Rename a custom addressbook. Member lists are never taken from
    /// `input`.
    pub fn update_addressbook(
        &self,
        id: &AddressbookId,
        input: Addressbook,
        principal: &Principal,
    ) -> RegistryResult<Addressbook> {
        if self.is_all(id) {
            return Err(RegistryError::validation(format!(
                "addressbook '{ALL_ADDRESSBOOK_NAME}' cannot be modified"
            )));
        }
        if !input.id.is_unassigned() && input.id != *id {
            return Err(RegistryError::validation(format!(
                "addressbook id {} does not match {id}",
                input.id
            )));
        }
        let name = validation::addressbook_name(&input.name)?;

        let _gate = self.exclusive()?;
        let stored = self.addressbooks.get(id)?;
        self.ensure_unique_name(&name, Some(id))?;
        if stored.audit.creation_differs(&input.audit) {
            warn!(%id, "ignoring client change to addressbook creation metadata");
        }
        let updated = self.addressbooks.modify(id, |addressbook| {
            addressbook.name = name;
            addressbook.audit.touch(principal);
        })?;
        info!(%id, name = %updated.name, %principal, "addressbook updated");
        Ok(updated)
    }

    /// Delete a custom addressbook, detaching every member first. Members
    /// stay alive in "all" and any other addressbook they belong to.
    pub fn delete_addressbook(
        &self,
        id: &AddressbookId,
        principal: &Principal,
    ) -> RegistryResult<()> {
        if self.is_all(id) {
            return Err(RegistryError::validation(format!(
                "addressbook '{ALL_ADDRESSBOOK_NAME}' cannot be deleted"
            )));
        }
        let _gate = self.exclusive()?;
        self.cascade_delete_addressbook(id)?;
        info!(%id, %principal, "addressbook deleted");
        Ok(())
    }

    /// Remove every contact, org, address, and custom addressbook. Returns
    /// the counts held before the clear.
    pub fn delete_all(&self, principal: &Principal) -> RegistryResult<RegistryStats> {
        let _gate = self.exclusive()?;
        let before = self.collect_stats()?;
        self.clear_all()?;
        info!(
            addressbooks = before.addressbooks,
            contacts = before.contacts,
            orgs = before.orgs,
            %principal,
            "registry cleared"
        );
        Ok(before)
    }

    fn ensure_unique_name(
        &self,
        name: &str,
        except: Option<&AddressbookId>,
    ) -> RegistryResult<()> {
        let taken = self
            .addressbooks
            .values()?
            .into_iter()
            .filter(|addressbook| Some(&addressbook.id) != except)
            .any(|addressbook| addressbook.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(RegistryError::duplicate("addressbook name", name));
        }
        Ok(())
    }

    pub(crate) fn exclusive(&self) -> RegistryResult<RwLockWriteGuard<'_, ()>> {
        self.gate
            .write()
            .map_err(|_| RegistryError::inconsistency("registry gate poisoned"))
    }

    pub(crate) fn shared(&self) -> RegistryResult<RwLockReadGuard<'_, ()>> {
        self.gate
            .read()
            .map_err(|_| RegistryError::inconsistency("registry gate poisoned"))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("all_id", &self.all_id)
            .field("addressbooks", &self.addressbooks)
            .field("contacts", &self.contacts)
            .field("orgs", &self.orgs)
            .field("addresses", &self.addresses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abook_types::{Address, AttributeType, ContactId};

    fn admin() -> Principal {
        Principal::new("admin")
    }

    fn contact_doc(id: &str, first: &str, addresses: Vec<Address>) -> MemberDocument<Contact> {
        let mut contact = Contact::named(Some(first), None);
        contact.id = ContactId::new(id);
        MemberDocument::new(contact, addresses)
    }

    fn book(id: &str, name: &str) -> AddressbookDocument {
        let mut addressbook = Addressbook::named(name);
        addressbook.id = AddressbookId::new(id);
        AddressbookDocument::new(addressbook)
    }

    #[test]
    fn new_registry_holds_only_all() {
        let registry = Registry::new(&admin()).unwrap();
        let books = registry.list_addressbooks().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].name, ALL_ADDRESSBOOK_NAME);
        assert_eq!(&books[0].id, registry.all_addressbook_id());
        assert_eq!(books[0].audit.created_by, "admin");
    }

    #[test]
    fn restore_merges_shared_entities() {
        let mut sales = book("a1", "Sales");
        let mut address = Address::email(AttributeType::Work, "ada@example.org");
        address.id = abook_types::AddressId::new("adr1");
        sales.contacts.push(contact_doc("c1", "Ada", vec![address]));
        let mut marketing = book("a2", "Marketing");
        marketing.contacts.push(contact_doc("c1", "Other", vec![]));

        let registry = Registry::restore(vec![sales, marketing], &admin()).unwrap();
        let contact = registry.contacts.get(&ContactId::new("c1")).unwrap();
        assert_eq!(contact.first_name.as_deref(), Some("Ada"));
        assert_eq!(contact.memberships.len(), 3);
        assert!(contact.memberships.contains(registry.all_addressbook_id()));
        assert_eq!(contact.address_ids.len(), 1);

        let stats = registry.stats().unwrap();
        assert_eq!(stats.addressbooks, 3);
        assert_eq!(stats.contacts, 1);
        assert_eq!(stats.addresses, 1);
    }

    #[test]
    fn restore_keeps_existing_all() {
        let mut all = book("all-id", "ALL");
        all.contacts.push(contact_doc("c1", "Ada", vec![]));
        let registry = Registry::restore(vec![all], &admin()).unwrap();
        assert_eq!(registry.all_addressbook_id().as_str(), "all-id");
        let all = registry.read_addressbook(registry.all_addressbook_id()).unwrap();
        assert_eq!(all.name, ALL_ADDRESSBOOK_NAME);
        assert_eq!(all.contact_ids, vec![ContactId::new("c1")]);
    }

    #[test]
    fn restore_rejects_two_reserved_books() {
        let err = Registry::restore(vec![book("x", "all"), book("y", "All")], &admin())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn restore_rejects_shared_address() {
        let mut address = Address::phone(AttributeType::Home, "1");
        address.id = abook_types::AddressId::new("adr1");
        let mut sales = book("a1", "Sales");
        sales
            .contacts
            .push(contact_doc("c1", "Ada", vec![address.clone()]));
        sales.contacts.push(contact_doc("c2", "Bob", vec![address]));
        let err = Registry::restore(vec![sales], &admin()).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn restore_rejects_missing_ids() {
        assert!(Registry::restore(vec![book("", "Sales")], &admin())
            .unwrap_err()
            .is_validation());
        assert!(
            Registry::restore(vec![book("a1", "x"), book("a1", "y")], &admin())
                .unwrap_err()
                .is_duplicate()
        );
    }

    #[test]
    fn documents_round_trip() {
        let mut sales = book("a1", "Sales");
        sales.contacts.push(contact_doc("c1", "Ada", vec![]));
        let registry = Registry::restore(vec![sales], &admin()).unwrap();
        let documents = registry.to_documents().unwrap();
        let again = Registry::restore(documents.clone(), &admin()).unwrap();
        assert_eq!(again.to_documents().unwrap(), documents);
        assert_eq!(again.all_addressbook_id(), registry.all_addressbook_id());
    }

    #[test]
    fn addressbook_lifecycle() {
        let p = admin();
        let registry = Registry::new(&p).unwrap();
        let sales = registry
            .create_addressbook(Addressbook::named(" Sales "), &p)
            .unwrap();
        assert_eq!(sales.name, "Sales");
        assert!(!sales.id.is_unassigned());

        let renamed = registry
            .update_addressbook(&sales.id, Addressbook::named("Key Accounts"), &Principal::new("eve"))
            .unwrap();
        assert_eq!(renamed.name, "Key Accounts");
        assert_eq!(renamed.audit.created_by, "admin");
        assert_eq!(renamed.audit.modified_by, "eve");

        registry.delete_addressbook(&sales.id, &p).unwrap();
        assert!(registry.read_addressbook(&sales.id).unwrap_err().is_not_found());
    }

    #[test]
    fn addressbook_rules() {
        let p = admin();
        let registry = Registry::new(&p).unwrap();
        let all = registry.all_addressbook_id().clone();

        assert!(registry
            .create_addressbook(Addressbook::named("all"), &p)
            .unwrap_err()
            .is_validation());
        let mut with_id = Addressbook::named("Sales");
        with_id.id = AddressbookId::new("mine");
        assert!(registry.create_addressbook(with_id, &p).unwrap_err().is_validation());

        registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap();
        assert!(registry
            .create_addressbook(Addressbook::named("sales"), &p)
            .unwrap_err()
            .is_duplicate());

        assert!(registry
            .update_addressbook(&all, Addressbook::named("x"), &p)
            .unwrap_err()
            .is_validation());
        assert!(registry.delete_addressbook(&all, &p).unwrap_err().is_validation());
        assert!(registry
            .delete_addressbook(&AddressbookId::new("missing"), &p)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn rename_to_own_name_is_allowed() {
        let p = admin();
        let registry = Registry::new(&p).unwrap();
        let sales = registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap();
        assert!(registry
            .update_addressbook(&sales.id, Addressbook::named("SALES"), &p)
            .is_ok());
    }

    #[test]
    fn delete_all_leaves_only_an_empty_all() {
        let p = admin();
        let registry = Registry::new(&p).unwrap();
        let sales = registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap();
        let marketing = registry
            .create_addressbook(Addressbook::named("Marketing"), &p)
            .unwrap();
        let ada = registry
            .create_member(&sales.id, Contact::named(Some("Ada"), None), &p)
            .unwrap();
        let mut shared = Contact::default();
        shared.id = ada.id.clone();
        registry.create_member(&marketing.id, shared, &p).unwrap();
        let acme = registry
            .create_member(&marketing.id, abook_types::Org::named("Acme"), &p)
            .unwrap();
        registry
            .create_address::<abook_types::Org>(
                &marketing.id,
                &acme.id,
                Address::email(AttributeType::Work, "hi@acme.test"),
                &p,
            )
            .unwrap();

        let before = registry.delete_all(&p).unwrap();
        assert_eq!(before.addressbooks, 3);
        assert_eq!(before.contacts, 1);
        assert_eq!(before.orgs, 1);
        assert_eq!(before.addresses, 1);

        let after = registry.stats().unwrap();
        assert_eq!(
            after,
            RegistryStats {
                addressbooks: 1,
                ..RegistryStats::default()
            }
        );
        let all = registry.read_addressbook(registry.all_addressbook_id()).unwrap();
        assert_eq!(all.member_count(), 0);
        let report = crate::ConsistencyValidator::validate(&registry).unwrap();
        assert!(report.is_consistent(), "{:?}", report.violations);

        // the registry stays usable afterwards
        registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap();
    }

    #[test]
    fn rename_to_reserved_name_is_rejected() {
        let p = admin();
        let registry = Registry::new(&p).unwrap();
        let sales = registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap();
        for reserved in ["all", " ALL "] {
            let err = registry
                .update_addressbook(&sales.id, Addressbook::named(reserved), &p)
                .unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(registry.read_addressbook(&sales.id).unwrap().name, "Sales");
        assert_eq!(registry.stats().unwrap().addressbooks, 2);
    }
}
