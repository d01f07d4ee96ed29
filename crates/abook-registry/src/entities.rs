//! Member and address operations, scoped to an addressbook.

use abook_store::EntityStore;
use abook_types::{Address, AddressId, AddressbookId, Audit, Principal};
use tracing::{error, info, warn};

use crate::coordinator::DetachOutcome;
use crate::error::{expect_indexed, RegistryError, RegistryResult};
use crate::member::Member;
use crate::registry::Registry;
use crate::validation;

impl Registry {
    /// Members of one addressbook, in membership order.
    pub fn list_members<M: Member>(&self, addressbook_id: &AddressbookId) -> RegistryResult<Vec<M>> {
        let _gate = self.shared()?;
        let addressbook = self.addressbooks.get(addressbook_id)?;
        M::member_ids(&addressbook)
            .iter()
            .map(|id| {
                M::store(self)
                    .get(id)
                    .map_err(expect_indexed(format!("addressbook {addressbook_id} lists")))
            })
            .collect()
    }

    /// Every entity of this kind, regardless of addressbook.
    pub fn list_all_members<M: Member>(&self) -> RegistryResult<Vec<M>> {
        let _gate = self.shared()?;
        Ok(M::store(self).values()?)
    }

    /// Create an entity in `addressbook_id`, or attach an existing one.
    ///
    /// Without an id, a new entity is created, validated, and attached to
    /// the target and to "all". With the id of an existing entity, that
    /// entity is attached to the target; fields in `input` are ignored.
    pub fn create_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        input: M,
        principal: &Principal,
    ) -> RegistryResult<M> {
        let _gate = self.exclusive()?;
        let target = self.addressbooks.get(addressbook_id)?;

        if input.has_assigned_key() {
            let id = input.key().clone();
            if !M::store(self).contains(&id)? {
                return Err(RegistryError::validation(format!(
                    "{} id {id} is assigned by the server",
                    M::KIND
                )));
            }
            if M::member_ids(&target).contains(&id) {
                return Err(RegistryError::duplicate(
                    M::KIND,
                    format!("{id} in addressbook {addressbook_id}"),
                ));
            }
            self.attach::<M>(&id, addressbook_id)?;
            info!(kind = M::KIND, %id, addressbook = %addressbook_id, %principal, "attached existing");
            return Ok(M::store(self).get(&id)?);
        }

        let mut entity = M::default();
        entity.copy_mutable_fields(&input);
        entity.normalize()?;
        entity.assign_new_key();
        *entity.audit_mut() = Audit::stamped(principal);
        let id = entity.key().clone();
        M::store(self).put(entity)?;

        let attached = self.attach::<M>(&id, addressbook_id).and_then(|_| {
            if self.is_all(addressbook_id) {
                Ok(false)
            } else {
                let all_id = self.all_addressbook_id().clone();
                self.attach::<M>(&id, &all_id)
            }
        });
        if let Err(err) = attached {
            if let Err(cleanup) = self.destroy::<M>(&id) {
                error!(kind = M::KIND, %id, %cleanup, "could not remove half-created entity");
            }
            return Err(err);
        }

        info!(kind = M::KIND, %id, addressbook = %addressbook_id, %principal, "created");
        Ok(M::store(self).get(&id)?)
    }

    /// Read an entity through one of its addressbooks.
    pub fn read_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        id: &M::Key,
    ) -> RegistryResult<M> {
        let _gate = self.shared()?;
        self.scoped_member::<M>(addressbook_id, id)
    }

    /// Read an entity by id alone.
    pub fn get_member<M: Member>(&self, id: &M::Key) -> RegistryResult<M> {
        let _gate = self.shared()?;
        Ok(M::store(self).get(id)?)
    }

    /// Replace the mutable fields of an entity. The change is visible
    /// through every addressbook the entity belongs to.
    pub fn update_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        id: &M::Key,
        input: M,
        principal: &Principal,
    ) -> RegistryResult<M> {
        if input.has_assigned_key() && input.key() != id {
            return Err(RegistryError::validation(format!(
                "{} id {} does not match {id}",
                M::KIND,
                input.key()
            )));
        }

        let _gate = self.exclusive()?;
        let stored = self.scoped_member::<M>(addressbook_id, id)?;
        let mut updated = stored.clone();
        updated.copy_mutable_fields(&input);
        updated.normalize()?;
        if stored.audit().creation_differs(input.audit()) {
            warn!(kind = M::KIND, %id, "ignoring client change to creation metadata");
        }
        updated.audit_mut().touch(principal);
        M::store(self).put(updated.clone())?;

        info!(kind = M::KIND, %id, %principal, "updated");
        Ok(updated)
    }

    /// Remove an entity from one addressbook. Removing it from "all"
    /// destroys it everywhere.
    pub fn delete_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        id: &M::Key,
        principal: &Principal,
    ) -> RegistryResult<DetachOutcome> {
        let _gate = self.exclusive()?;
        self.addressbooks.get(addressbook_id)?;
        let outcome = self.detach::<M>(id, addressbook_id)?;
        info!(kind = M::KIND, %id, addressbook = %addressbook_id, ?outcome, %principal, "deleted");
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Addresses
    // ------------------------------------------------------------------

    pub fn list_addresses<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
    ) -> RegistryResult<Vec<Address>> {
        let _gate = self.shared()?;
        let owner = self.scoped_member::<M>(addressbook_id, owner_id)?;
        self.addresses
            .get_many(owner.address_ids())
            .map_err(expect_indexed(format!("{} {owner_id} references", M::KIND)))
    }

    /// Add an address to an entity. The id is always server-generated.
    pub fn create_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        input: Address,
        principal: &Principal,
    ) -> RegistryResult<Address> {
        if !input.id.is_unassigned() {
            return Err(RegistryError::validation(format!(
                "address id {} is assigned by the server",
                input.id
            )));
        }
        let mut address = input;
        validation::address(&mut address)?;
        address.id = AddressId::generate();
        address.audit = Audit::stamped(principal);

        let _gate = self.exclusive()?;
        self.scoped_member::<M>(addressbook_id, owner_id)?;
        self.addresses.put(address.clone())?;
        let linked = M::store(self).modify(owner_id, |owner| {
            owner.address_ids_mut().push(address.id.clone())
        });
        if let Err(err) = linked {
            if let Err(cleanup) = self.addresses.remove(&address.id) {
                error!(id = %address.id, %cleanup, "could not remove unlinked address");
            }
            return Err(err.into());
        }

        info!(id = %address.id, owner = %owner_id, %principal, "address created");
        Ok(address)
    }

    pub fn read_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
    ) -> RegistryResult<Address> {
        let _gate = self.shared()?;
        self.owned_address::<M>(addressbook_id, owner_id, address_id)
    }

    /// Replace the mutable fields of an owned address. Its kind cannot
    /// change.
    pub fn update_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
        input: Address,
        principal: &Principal,
    ) -> RegistryResult<Address> {
        if !input.id.is_unassigned() && input.id != *address_id {
            return Err(RegistryError::validation(format!(
                "address id {} does not match {address_id}",
                input.id
            )));
        }

        let _gate = self.exclusive()?;
        let stored = self.owned_address::<M>(addressbook_id, owner_id, address_id)?;
        validation::address_kind_unchanged(stored.address_type, input.address_type)?;
        let mut updated = stored.clone();
        updated.copy_mutable_fields(&input);
        validation::address(&mut updated)?;
        if stored.audit.creation_differs(&input.audit) {
            warn!(id = %address_id, "ignoring client change to address creation metadata");
        }
        updated.audit.touch(principal);
        self.addresses.put(updated.clone())?;

        info!(id = %address_id, owner = %owner_id, %principal, "address updated");
        Ok(updated)
    }

    pub fn delete_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
        principal: &Principal,
    ) -> RegistryResult<()> {
        let _gate = self.exclusive()?;
        self.owned_address::<M>(addressbook_id, owner_id, address_id)?;
        M::store(self).modify(owner_id, |owner| {
            owner.address_ids_mut().retain(|id| id != address_id)
        })?;
        if !self.addresses.remove(address_id)? {
            return Err(RegistryError::inconsistency(format!(
                "address {address_id} vanished during delete"
            )));
        }
        info!(id = %address_id, owner = %owner_id, %principal, "address deleted");
        Ok(())
    }

    /// The entity, provided `addressbook_id` exists and lists it.
    fn scoped_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        id: &M::Key,
    ) -> RegistryResult<M> {
        let addressbook = self.addressbooks.get(addressbook_id)?;
        if !M::member_ids(&addressbook).contains(id) {
            return Err(RegistryError::not_found(
                M::KIND,
                format!("{id} in addressbook {addressbook_id}"),
            ));
        }
        M::store(self)
            .get(id)
            .map_err(expect_indexed(format!("addressbook {addressbook_id} lists")))
    }

    /// The address, provided its owner is reachable through
    /// `addressbook_id` and owns it.
    fn owned_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
    ) -> RegistryResult<Address> {
        let owner = self.scoped_member::<M>(addressbook_id, owner_id)?;
        if !owner.address_ids().contains(address_id) {
            return Err(RegistryError::not_found(
                "address",
                format!("{address_id} of {} {owner_id}", M::KIND),
            ));
        }
        self.addresses
            .get(address_id)
            .map_err(expect_indexed(format!("{} {owner_id} references", M::KIND)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abook_types::{Addressbook, AddressType, AttributeType, Contact, Org, OrgType};

    struct Fixture {
        registry: Registry,
        p: Principal,
        all: AddressbookId,
        sales: AddressbookId,
        marketing: AddressbookId,
    }

    fn fixture() -> Fixture {
        let p = Principal::new("tester");
        let registry = Registry::new(&p).unwrap();
        let all = registry.all_addressbook_id().clone();
        let sales = registry.create_addressbook(Addressbook::named("Sales"), &p).unwrap().id;
        let marketing = registry
            .create_addressbook(Addressbook::named("Marketing"), &p)
            .unwrap()
            .id;
        Fixture {
            registry,
            p,
            all,
            sales,
            marketing,
        }
    }

    #[test]
    fn shared_contact_lifecycle() {
        let Fixture {
            registry,
            p,
            all,
            sales,
            marketing,
        } = fixture();

        // create C in A1
        let c = registry
            .create_member(&sales, Contact::named(Some("Ada"), Some("Lovelace")), &p)
            .unwrap();
        assert_eq!(c.memberships, vec![sales.clone(), all.clone()]);
        assert_eq!(c.full_name.as_deref(), Some("Ada Lovelace"));

        // attach C to A2
        let mut attach = Contact::default();
        attach.id = c.id.clone();
        let c = registry.create_member(&marketing, attach, &p).unwrap();
        assert_eq!(c.memberships.len(), 3);
        assert_eq!(c.first_name.as_deref(), Some("Ada"));

        // delete C from A1
        let outcome = registry.delete_member::<Contact>(&sales, &c.id, &p).unwrap();
        assert_eq!(outcome, DetachOutcome::Detached);
        assert!(registry.list_members::<Contact>(&sales).unwrap().is_empty());
        let via_marketing: Contact = registry.read_member(&marketing, &c.id).unwrap();
        assert_eq!(via_marketing.memberships, vec![all.clone(), marketing.clone()]);

        // delete C from ALL
        let outcome = registry.delete_member::<Contact>(&all, &c.id, &p).unwrap();
        assert_eq!(outcome, DetachOutcome::Destroyed);
        for book in [&all, &sales, &marketing] {
            assert!(registry.list_members::<Contact>(book).unwrap().is_empty());
            assert!(registry
                .read_member::<Contact>(book, &c.id)
                .unwrap_err()
                .is_not_found());
        }
        assert!(registry.get_member::<Contact>(&c.id).unwrap_err().is_not_found());
    }

    #[test]
    fn create_in_all_attaches_once() {
        let f = fixture();
        let org = f
            .registry
            .create_member(&f.all, Org::named("Acme"), &f.p)
            .unwrap();
        assert_eq!(org.memberships, vec![f.all.clone()]);
        assert_eq!(org.org_type, Some(OrgType::Other));
    }

    #[test]
    fn attach_twice_is_duplicate() {
        let f = fixture();
        let c = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Bob"), None), &f.p)
            .unwrap();
        let mut again = Contact::default();
        again.id = c.id.clone();
        assert!(f
            .registry
            .create_member(&f.sales, again, &f.p)
            .unwrap_err()
            .is_duplicate());
    }

    #[test]
    fn unknown_client_id_is_rejected() {
        let f = fixture();
        let mut input = Contact::named(Some("Bob"), None);
        input.id = abook_types::ContactId::new("made-up");
        assert!(f
            .registry
            .create_member(&f.sales, input, &f.p)
            .unwrap_err()
            .is_validation());
        assert!(f.registry.list_all_members::<Contact>().unwrap().is_empty());
    }

    #[test]
    fn create_in_missing_addressbook_is_not_found() {
        let f = fixture();
        let err = f
            .registry
            .create_member(
                &AddressbookId::new("nope"),
                Contact::named(Some("Bob"), None),
                &f.p,
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(f.registry.list_all_members::<Contact>().unwrap().is_empty());
    }

    #[test]
    fn invalid_contact_leaves_no_trace() {
        let f = fixture();
        let err = f
            .registry
            .create_member(&f.sales, Contact::default(), &f.p)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(f.registry.list_all_members::<Contact>().unwrap().is_empty());
    }

    #[test]
    fn update_is_visible_everywhere() {
        let f = fixture();
        let c = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Ada"), None), &f.p)
            .unwrap();
        let mut attach = Contact::default();
        attach.id = c.id.clone();
        f.registry.create_member(&f.marketing, attach, &f.p).unwrap();

        let mut input = c.clone();
        input.last_name = Some("Byron".into());
        input.memberships.clear();
        input.audit.created_by = "mallory".into();
        let updated = f
            .registry
            .update_member(&f.sales, &c.id, input, &Principal::new("editor"))
            .unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Ada Byron"));
        assert_eq!(updated.memberships.len(), 3);
        assert_eq!(updated.audit.created_by, "tester");
        assert_eq!(updated.audit.modified_by, "editor");

        let seen: Contact = f.registry.read_member(&f.marketing, &c.id).unwrap();
        assert_eq!(seen, updated);
    }

    #[test]
    fn update_outside_scope_is_not_found() {
        let f = fixture();
        let c = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Ada"), None), &f.p)
            .unwrap();
        let err = f
            .registry
            .update_member(&f.marketing, &c.id, c.clone(), &f.p)
            .unwrap_err();
        assert!(err.is_not_found());

        let mut other = c.clone();
        other.id = abook_types::ContactId::new("different");
        assert!(f
            .registry
            .update_member(&f.sales, &c.id, other, &f.p)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn deleting_addressbook_keeps_shared_members() {
        let f = fixture();
        let c = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Ada"), None), &f.p)
            .unwrap();
        let o = f
            .registry
            .create_member(&f.sales, Org::named("Acme"), &f.p)
            .unwrap();

        f.registry.delete_addressbook(&f.sales, &f.p).unwrap();
        let c: Contact = f.registry.read_member(&f.all, &c.id).unwrap();
        assert_eq!(c.memberships, vec![f.all.clone()]);
        let o: Org = f.registry.read_member(&f.all, &o.id).unwrap();
        assert_eq!(o.memberships, vec![f.all.clone()]);
    }

    #[test]
    fn address_lifecycle() {
        let f = fixture();
        let c = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Ada"), None), &f.p)
            .unwrap();

        let phone = f
            .registry
            .create_address::<Contact>(
                &f.sales,
                &c.id,
                Address::phone(AttributeType::Work, "123"),
                &f.p,
            )
            .unwrap();
        assert!(!phone.id.is_unassigned());

        // reachable through every addressbook of the owner
        let via_all = f
            .registry
            .read_address::<Contact>(&f.all, &c.id, &phone.id)
            .unwrap();
        assert_eq!(via_all, phone);

        let mut change = Address::phone(AttributeType::Mobile, "456");
        change.id = phone.id.clone();
        let updated = f
            .registry
            .update_address::<Contact>(&f.sales, &c.id, &phone.id, change, &f.p)
            .unwrap();
        assert_eq!(updated.value.as_deref(), Some("456"));
        assert_eq!(updated.address_type, Some(AddressType::Phone));

        let as_email = Address::email(AttributeType::Work, "a@example.org");
        assert!(f
            .registry
            .update_address::<Contact>(&f.sales, &c.id, &phone.id, as_email, &f.p)
            .unwrap_err()
            .is_validation());

        f.registry
            .delete_address::<Contact>(&f.sales, &c.id, &phone.id, &f.p)
            .unwrap();
        assert!(f
            .registry
            .list_addresses::<Contact>(&f.sales, &c.id)
            .unwrap()
            .is_empty());
        assert!(f
            .registry
            .read_address::<Contact>(&f.sales, &c.id, &phone.id)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn address_of_other_owner_is_not_found() {
        let f = fixture();
        let a = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Ada"), None), &f.p)
            .unwrap();
        let b = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Bob"), None), &f.p)
            .unwrap();
        let adr = f
            .registry
            .create_address::<Contact>(&f.sales, &a.id, Address::web(AttributeType::Main, "x.org"), &f.p)
            .unwrap();
        assert!(f
            .registry
            .read_address::<Contact>(&f.sales, &b.id, &adr.id)
            .unwrap_err()
            .is_not_found());
        assert!(f
            .registry
            .update_address::<Contact>(
                &f.sales,
                &b.id,
                &adr.id,
                Address::web(AttributeType::Main, "y.org"),
                &f.p
            )
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn destroying_owner_removes_addresses() {
        let f = fixture();
        let o = f
            .registry
            .create_member(&f.marketing, Org::named("Acme"), &f.p)
            .unwrap();
        f.registry
            .create_address::<Org>(
                &f.marketing,
                &o.id,
                Address::email(AttributeType::Main, "info@acme.test"),
                &f.p,
            )
            .unwrap();
        assert_eq!(f.registry.stats().unwrap().addresses, 1);

        f.registry.delete_member::<Org>(&f.all, &o.id, &f.p).unwrap();
        assert_eq!(f.registry.stats().unwrap().addresses, 0);
    }

    #[test]
    fn client_address_id_is_rejected() {
        let f = fixture();
        let c = f
            .registry
            .create_member(&f.sales, Contact::named(Some("Ada"), None), &f.p)
            .unwrap();
        let mut input = Address::phone(AttributeType::Home, "1");
        input.id = AddressId::new("mine");
        assert!(f
            .registry
            .create_address::<Contact>(&f.sales, &c.id, input, &f.p)
            .unwrap_err()
            .is_validation());
    }
}
