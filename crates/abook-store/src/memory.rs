use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{StoreError, StoreResult};
use crate::keyed::Keyed;
use crate::traits::EntityStore;

/// In-memory, HashMap-based entity store.
///
/// All entities are held behind a `RwLock` for safe concurrent access.
/// Entities are cloned on read and moved in on write.
pub struct InMemoryStore<T: Keyed> {
    entries: RwLock<HashMap<T::Key, T>>,
}

impl<T: Keyed> InMemoryStore<T> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<T::Key, T>>> {
        self.entries
            .read()
            .map_err(|_| StoreError::LockPoisoned { kind: T::KIND })
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<T::Key, T>>> {
        self.entries
            .write()
            .map_err(|_| StoreError::LockPoisoned { kind: T::KIND })
    }

    fn not_found(key: &T::Key) -> StoreError {
        StoreError::NotFound {
            kind: T::KIND,
            id: key.to_string(),
        }
    }
}

impl<T: Keyed> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> EntityStore<T> for InMemoryStore<T> {
    fn put(&self, entity: T) -> StoreResult<Option<T>> {
        let mut map = self.write_lock()?;
        Ok(map.insert(entity.key().clone(), entity))
    }

    fn get(&self, key: &T::Key) -> StoreResult<T> {
        let map = self.read_lock()?;
        map.get(key).cloned().ok_or_else(|| Self::not_found(key))
    }

    fn remove(&self, key: &T::Key) -> StoreResult<bool> {
        let mut map = self.write_lock()?;
        Ok(map.remove(key).is_some())
    }

    fn contains(&self, key: &T::Key) -> StoreResult<bool> {
        let map = self.read_lock()?;
        Ok(map.contains_key(key))
    }

    fn keys(&self) -> StoreResult<Vec<T::Key>> {
        let map = self.read_lock()?;
        let mut keys: Vec<T::Key> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn values(&self) -> StoreResult<Vec<T>> {
        let map = self.read_lock()?;
        let mut values: Vec<T> = map.values().cloned().collect();
        values.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(values)
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read_lock()?.len())
    }

    fn modify<F>(&self, key: &T::Key, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut T),
    {
        let mut map = self.write_lock()?;
        let entity = map.get_mut(key).ok_or_else(|| Self::not_found(key))?;
        f(entity);
        Ok(entity.clone())
    }
}

impl<T: Keyed> std::fmt::Debug for InMemoryStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.read_lock().map(|map| map.len()).unwrap_or(0);
        f.debug_struct("InMemoryStore")
            .field("kind", &T::KIND)
            .field("entry_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abook_types::{Address, AddressId, AttributeType, Contact, ContactId};

    fn make_address(id: &str, number: &str) -> Address {
        let mut adr = Address::phone(AttributeType::Home, number);
        adr.id = AddressId::new(id);
        adr
    }

    fn make_contact(id: &str, first: &str) -> Contact {
        let mut contact = Contact::named(Some(first), None);
        contact.id = ContactId::new(id);
        contact
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryStore::<Address>::new();
        assert!(store.put(make_address("a1", "111")).unwrap().is_none());
        let read_back = store.get(&AddressId::new("a1")).unwrap();
        assert_eq!(read_back.value.as_deref(), Some("111"));
    }

    #[test]
    fn put_replaces_and_returns_previous() {
        let store = InMemoryStore::<Address>::new();
        store.put(make_address("a1", "111")).unwrap();
        let previous = store.put(make_address("a1", "222")).unwrap();
        assert_eq!(previous.unwrap().value.as_deref(), Some("111"));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn get_missing_is_not_found() {
        let store: InMemoryStore<Address> = InMemoryStore::new();
        let err = store.get(&AddressId::new("nope")).unwrap_err();
        assert_eq!(
            err,
            StoreError::NotFound {
                kind: "address",
                id: "nope".into()
            }
        );
    }

    #[test]
    fn remove_reports_presence() {
        let store = InMemoryStore::<Address>::new();
        store.put(make_address("a1", "111")).unwrap();
        assert!(store.remove(&AddressId::new("a1")).unwrap());
        assert!(!store.remove(&AddressId::new("a1")).unwrap());
        assert!(!store.contains(&AddressId::new("a1")).unwrap());
    }

    // -----------------------------------------------------------------------
    // Modify
    // -----------------------------------------------------------------------

    #[test]
    fn modify_updates_in_place() {
        let store = InMemoryStore::<Contact>::new();
        store.put(make_contact("c1", "Jo")).unwrap();
        let updated = store
            .modify(&ContactId::new("c1"), |c| c.note = Some("vip".into()))
            .unwrap();
        assert_eq!(updated.note.as_deref(), Some("vip"));
        assert_eq!(
            store.get(&ContactId::new("c1")).unwrap().note.as_deref(),
            Some("vip")
        );
    }

    #[test]
    fn modify_missing_is_not_found() {
        let store: InMemoryStore<Contact> = InMemoryStore::new();
        let result = store.modify(&ContactId::new("ghost"), |_| {});
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn keys_and_values_are_sorted() {
        let store = InMemoryStore::<Contact>::new();
        store.put(make_contact("c3", "C")).unwrap();
        store.put(make_contact("c1", "A")).unwrap();
        store.put(make_contact("c2", "B")).unwrap();

        let keys: Vec<String> = store.keys().unwrap().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["c1", "c2", "c3"]);

        let names: Vec<String> = store
            .values()
            .unwrap()
            .into_iter()
            .filter_map(|c| c.first_name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn get_many_fails_on_first_missing() {
        let store = InMemoryStore::<Contact>::new();
        store.put(make_contact("c1", "A")).unwrap();
        let ok = store.get_many(&[ContactId::new("c1")]).unwrap();
        assert_eq!(ok.len(), 1);
        assert!(store
            .get_many(&[ContactId::new("c1"), ContactId::new("c9")])
            .is_err());
    }

    #[test]
    fn is_empty_follows_contents() {
        let store = InMemoryStore::<Contact>::new();
        assert!(store.is_empty().unwrap());
        store.put(make_contact("c1", "A")).unwrap();
        assert!(!store.is_empty().unwrap());
        store.remove(&ContactId::new("c1")).unwrap();
        assert!(store.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_puts_are_all_visible() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryStore::<Address>::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .put(make_address(&format!("a{i}"), &i.to_string()))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(store.len().unwrap(), 8);
    }

    #[test]
    fn debug_format() {
        let store: InMemoryStore<Contact> = InMemoryStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryStore"));
        assert!(debug.contains("contact"));
    }
}
