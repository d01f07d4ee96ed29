//! Membership coordinator: the only code that edits both sides of the
//! membership relation.
//!
//! Callers hold the registry gate exclusively. Each helper checks both
//! views before writing, writes the addressbook side first, and rolls it
//! back if the entity side fails.

use abook_store::EntityStore;
use abook_types::{AddressbookId, Contact, Org};
use tracing::{debug, error, info};

use crate::error::{expect_indexed, RegistryError, RegistryResult};
use crate::member::Member;
use crate::registry::Registry;

/// What a detach did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetachOutcome {
    /// One membership was removed; the entity is still alive.
    Detached,
    /// The entity was removed from every addressbook and deleted.
    Destroyed,
}

impl Registry {
    /// Make `entity_id` a member of `addressbook_id`. Returns `false` if it
    /// already was.
    pub(crate) fn attach<M: Member>(
        &self,
        entity_id: &M::Key,
        addressbook_id: &AddressbookId,
    ) -> RegistryResult<bool> {
        let entity = M::store(self).get(entity_id)?;
        let addressbook = self.addressbooks.get(addressbook_id)?;
        let on_entity = entity.memberships().contains(addressbook_id);
        let on_book = M::member_ids(&addressbook).contains(entity_id);
        match (on_entity, on_book) {
            (true, true) => return Ok(false),
            (false, false) => {}
            _ => return Err(asymmetric::<M>(entity_id, addressbook_id)),
        }

        self.addressbooks
            .modify(addressbook_id, |ab| M::member_ids_mut(ab).push(entity_id.clone()))?;
        let attached = M::store(self).modify(entity_id, |member| {
            member.memberships_mut().push(addressbook_id.clone())
        });
        if let Err(err) = attached {
            self.rollback(addressbook_id, |ab| {
                M::member_ids_mut(ab).retain(|id| id != entity_id)
            });
            return Err(RegistryError::inconsistency(format!(
                "attaching {} {entity_id} to {addressbook_id}: {err}",
                M::KIND
            )));
        }

        debug!(kind = M::KIND, id = %entity_id, addressbook = %addressbook_id, "attached");
        Ok(true)
    }

    /// Remove `entity_id` from `addressbook_id`. Removing it from "all"
    /// destroys it instead.
    pub(crate) fn detach<M: Member>(
        &self,
        entity_id: &M::Key,
        addressbook_id: &AddressbookId,
    ) -> RegistryResult<DetachOutcome> {
        if self.is_all(addressbook_id) {
            self.destroy::<M>(entity_id)?;
            return Ok(DetachOutcome::Destroyed);
        }

        let entity = M::store(self).get(entity_id)?;
        let addressbook = self.addressbooks.get(addressbook_id)?;
        let on_entity = entity.memberships().contains(addressbook_id);
        let on_book = M::member_ids(&addressbook).contains(entity_id);
        match (on_entity, on_book) {
            (true, true) => {}
            (false, false) => {
                return Err(RegistryError::not_found(
                    M::KIND,
                    format!("{entity_id} in addressbook {addressbook_id}"),
                ))
            }
            _ => return Err(asymmetric::<M>(entity_id, addressbook_id)),
        }

        self.addressbooks.modify(addressbook_id, |ab| {
            M::member_ids_mut(ab).retain(|id| id != entity_id)
        })?;
        let detached = M::store(self).modify(entity_id, |member| {
            member.memberships_mut().retain(|id| id != addressbook_id)
        });
        if let Err(err) = detached {
            self.rollback(addressbook_id, |ab| M::member_ids_mut(ab).push(entity_id.clone()));
            return Err(RegistryError::inconsistency(format!(
                "detaching {} {entity_id} from {addressbook_id}: {err}",
                M::KIND
            )));
        }

        debug!(kind = M::KIND, id = %entity_id, addressbook = %addressbook_id, "detached");
        Ok(DetachOutcome::Detached)
    }

    /// Remove an entity from every addressbook, delete its addresses, then
    /// delete the entity.
    ///
    /// Every referenced addressbook and address is checked before anything
    /// is written, so a broken reference fails the whole destroy with no
    /// partial effect.
    pub(crate) fn destroy<M: Member>(&self, entity_id: &M::Key) -> RegistryResult<()> {
        let entity = M::store(self).get(entity_id)?;

        for addressbook_id in entity.memberships() {
            if !self.addressbooks.contains(addressbook_id)? {
                return Err(RegistryError::inconsistency(format!(
                    "{} {entity_id} is a member of missing addressbook {addressbook_id}",
                    M::KIND
                )));
            }
        }
        for address_id in entity.address_ids() {
            if !self.addresses.contains(address_id)? {
                return Err(RegistryError::inconsistency(format!(
                    "{} {entity_id} references missing address {address_id}",
                    M::KIND
                )));
            }
        }

        for addressbook_id in entity.memberships() {
            self.addressbooks
                .modify(addressbook_id, |ab| {
                    M::member_ids_mut(ab).retain(|id| id != entity_id)
                })
                .map_err(expect_indexed(format!("detaching {} {entity_id}", M::KIND)))?;
        }
        for address_id in entity.address_ids() {
            if !self.addresses.remove(address_id)? {
                return Err(RegistryError::inconsistency(format!(
                    "address {address_id} of {} {entity_id} vanished during destroy",
                    M::KIND
                )));
            }
        }
        if !M::store(self).remove(entity_id)? {
            return Err(RegistryError::inconsistency(format!(
                "{} {entity_id} vanished during destroy",
                M::KIND
            )));
        }

        info!(
            kind = M::KIND,
            id = %entity_id,
            memberships = entity.memberships().len(),
            addresses = entity.address_ids().len(),
            "destroyed"
        );
        Ok(())
    }

    /// Detach every member of a custom addressbook, then delete it.
    pub(crate) fn cascade_delete_addressbook(
        &self,
        addressbook_id: &AddressbookId,
    ) -> RegistryResult<()> {
        let addressbook = self.addressbooks.get(addressbook_id)?;
        for contact_id in &addressbook.contact_ids {
            self.detach::<Contact>(contact_id, addressbook_id)?;
        }
        for org_id in &addressbook.org_ids {
            self.detach::<Org>(org_id, addressbook_id)?;
        }
        if !self.addressbooks.remove(addressbook_id)? {
            return Err(RegistryError::inconsistency(format!(
                "addressbook {addressbook_id} vanished during delete"
            )));
        }
        debug!(
            addressbook = %addressbook_id,
            members = addressbook.member_count(),
            "cascade delete complete"
        );
        Ok(())
    }

    /// Destroy every contact and org, then delete every custom addressbook.
    /// Only an empty "all" survives.
    pub(crate) fn clear_all(&self) -> RegistryResult<()> {
        for contact_id in self.contacts.keys()? {
            self.destroy::<Contact>(&contact_id)?;
        }
        for org_id in self.orgs.keys()? {
            self.destroy::<Org>(&org_id)?;
        }
        for addressbook_id in self.addressbooks.keys()? {
            if !self.is_all(&addressbook_id) {
                self.cascade_delete_addressbook(&addressbook_id)?;
            }
        }
        Ok(())
    }

    fn rollback<F>(&self, addressbook_id: &AddressbookId, undo: F)
    where
        F: FnOnce(&mut abook_types::Addressbook),
    {
        if let Err(err) = self.addressbooks.modify(addressbook_id, undo) {
            error!(addressbook = %addressbook_id, %err, "membership rollback failed");
        }
    }
}

fn asymmetric<M: Member>(entity_id: &M::Key, addressbook_id: &AddressbookId) -> RegistryError {
    RegistryError::inconsistency(format!(
        "{} {entity_id} and addressbook {addressbook_id} disagree on membership",
        M::KIND
    ))
}
