use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use abook_registry::{
    ConsistencyReport, ConsistencyValidator, DetachOutcome, Member, Registry, RegistryResult,
    RegistryStats,
};
use abook_snapshot::SnapshotStore;
use abook_types::{Address, AddressId, Addressbook, AddressbookId, Principal};
use tracing::{debug, error, info};

use crate::error::{ServiceError, ServiceResult};
use crate::paging::{DefaultOrder, ListQuery};

/// Addressbook service: the registry plus write-through persistence.
///
/// Every successful mutation is followed by a full snapshot export.
/// Mutation and export run under one lock, so exports reach the snapshot
/// store in mutation order and an older snapshot never overwrites a newer
/// one. A failed export is logged and does not fail the mutation.
pub struct AddressbookService {
    registry: Registry,
    snapshot: Arc<dyn SnapshotStore>,
    write_lock: Mutex<()>,
}

impl AddressbookService {
    /// Import the snapshot, rebuild the registry, and export it once so the
    /// persistent file reflects any bootstrap changes (a created "all"
    /// addressbook, normalized memberships).
    pub fn open(snapshot: Arc<dyn SnapshotStore>, principal: &Principal) -> ServiceResult<Self> {
        let documents = snapshot.import()?;
        let registry = Registry::restore(documents, principal)?;
        let service = Self {
            registry,
            snapshot,
            write_lock: Mutex::new(()),
        };
        service.persist();
        info!(all = %service.registry.all_addressbook_id(), "addressbook service ready");
        Ok(service)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn all_addressbook_id(&self) -> &AddressbookId {
        self.registry.all_addressbook_id()
    }

    pub fn stats(&self) -> ServiceResult<RegistryStats> {
        Ok(self.registry.stats()?)
    }

    /// Audit every cross-index invariant.
    pub fn verify(&self) -> ServiceResult<ConsistencyReport> {
        Ok(ConsistencyValidator::validate(&self.registry)?)
    }

    fn write<T, F>(&self, op: F) -> ServiceResult<T>
    where
        F: FnOnce(&Registry) -> RegistryResult<T>,
    {
        let _write = self.write_lock.lock().map_err(|_| ServiceError::LockPoisoned)?;
        let value = op(&self.registry)?;
        self.persist();
        Ok(value)
    }

    fn persist(&self) {
        let documents = match self.registry.to_documents() {
            Ok(documents) => documents,
            Err(err) => {
                error!(%err, "could not build snapshot");
                return;
            }
        };
        if let Err(err) = self.snapshot.export(&documents) {
            error!(%err, "snapshot export failed");
        }
    }

    // ---- Addressbooks ----

    pub fn list_addressbooks(&self, query: &ListQuery) -> ServiceResult<Vec<Addressbook>> {
        self.list_addressbooks_by(query, Addressbook::default_order)
    }

    pub fn list_addressbooks_by<F>(&self, query: &ListQuery, compare: F) -> ServiceResult<Vec<Addressbook>>
    where
        F: FnMut(&Addressbook, &Addressbook) -> Ordering,
    {
        log_list("addressbook", query);
        Ok(query.apply(self.registry.list_addressbooks()?, compare))
    }

    pub fn create_addressbook(
        &self,
        input: Addressbook,
        principal: &Principal,
    ) -> ServiceResult<Addressbook> {
        self.write(|registry| registry.create_addressbook(input, principal))
    }

    pub fn read_addressbook(&self, id: &AddressbookId) -> ServiceResult<Addressbook> {
        Ok(self.registry.read_addressbook(id)?)
    }

    pub fn update_addressbook(
        &self,
        id: &AddressbookId,
        input: Addressbook,
        principal: &Principal,
    ) -> ServiceResult<Addressbook> {
        self.write(|registry| registry.update_addressbook(id, input, principal))
    }

    pub fn delete_addressbook(&self, id: &AddressbookId, principal: &Principal) -> ServiceResult<()> {
        self.write(|registry| registry.delete_addressbook(id, principal))
    }

    // ---- Contacts and orgs ----

    pub fn list_members<M>(&self, addressbook_id: &AddressbookId, query: &ListQuery) -> ServiceResult<Vec<M>>
    where
        M: Member + DefaultOrder,
    {
        self.list_members_by::<M, _>(addressbook_id, query, M::default_order)
    }

    pub fn list_members_by<M, F>(
        &self,
        addressbook_id: &AddressbookId,
        query: &ListQuery,
        compare: F,
    ) -> ServiceResult<Vec<M>>
    where
        M: Member,
        F: FnMut(&M, &M) -> Ordering,
    {
        log_list(M::KIND, query);
        Ok(query.apply(self.registry.list_members::<M>(addressbook_id)?, compare))
    }

    /// Every entity of the kind, across all addressbooks.
    pub fn list_all_members<M>(&self, query: &ListQuery) -> ServiceResult<Vec<M>>
    where
        M: Member + DefaultOrder,
    {
        self.list_all_members_by::<M, _>(query, M::default_order)
    }

    pub fn list_all_members_by<M, F>(&self, query: &ListQuery, compare: F) -> ServiceResult<Vec<M>>
    where
        M: Member,
        F: FnMut(&M, &M) -> Ordering,
    {
        log_list(M::KIND, query);
        Ok(query.apply(self.registry.list_all_members::<M>()?, compare))
    }

    /// Create a new entity, or attach an existing one when `input` carries
    /// its id.
    pub fn create_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        input: M,
        principal: &Principal,
    ) -> ServiceResult<M> {
        self.write(|registry| registry.create_member(addressbook_id, input, principal))
    }

    pub fn read_member<M: Member>(&self, addressbook_id: &AddressbookId, id: &M::Key) -> ServiceResult<M> {
        Ok(self.registry.read_member(addressbook_id, id)?)
    }

    pub fn update_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        id: &M::Key,
        input: M,
        principal: &Principal,
    ) -> ServiceResult<M> {
        self.write(|registry| registry.update_member(addressbook_id, id, input, principal))
    }

    /// Detach from one addressbook; from "all" this deletes the entity.
    pub fn delete_member<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        id: &M::Key,
        principal: &Principal,
    ) -> ServiceResult<DetachOutcome> {
        self.write(|registry| registry.delete_member::<M>(addressbook_id, id, principal))
    }

    // ---- Addresses ----

    pub fn list_addresses<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        query: &ListQuery,
    ) -> ServiceResult<Vec<Address>> {
        self.list_addresses_by::<M, _>(addressbook_id, owner_id, query, Address::default_order)
    }

    pub fn list_addresses_by<M, F>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        query: &ListQuery,
        compare: F,
    ) -> ServiceResult<Vec<Address>>
    where
        M: Member,
        F: FnMut(&Address, &Address) -> Ordering,
    {
        log_list("address", query);
        let addresses = self.registry.list_addresses::<M>(addressbook_id, owner_id)?;
        Ok(query.apply(addresses, compare))
    }

    pub fn create_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        input: Address,
        principal: &Principal,
    ) -> ServiceResult<Address> {
        self.write(|registry| registry.create_address::<M>(addressbook_id, owner_id, input, principal))
    }

    pub fn read_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
    ) -> ServiceResult<Address> {
        Ok(self
            .registry
            .read_address::<M>(addressbook_id, owner_id, address_id)?)
    }

    pub fn update_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
        input: Address,
        principal: &Principal,
    ) -> ServiceResult<Address> {
        self.write(|registry| {
            registry.update_address::<M>(addressbook_id, owner_id, address_id, input, principal)
        })
    }

    pub fn delete_address<M: Member>(
        &self,
        addressbook_id: &AddressbookId,
        owner_id: &M::Key,
        address_id: &AddressId,
        principal: &Principal,
    ) -> ServiceResult<()> {
        self.write(|registry| {
            registry.delete_address::<M>(addressbook_id, owner_id, address_id, principal)
        })
    }

    /// Remove everything except an empty "all" addressbook, exporting once.
    /// Returns the counts held before the clear.
    pub fn delete_all(&self, principal: &Principal) -> ServiceResult<RegistryStats> {
        self.write(|registry| registry.delete_all(principal))
    }
}

fn log_list(kind: &str, query: &ListQuery) {
    debug!(
        kind,
        query = ?query.query,
        query_type = ?query.query_type,
        position = query.position,
        size = query.size,
        "list"
    );
}
