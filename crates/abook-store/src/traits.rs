use crate::error::StoreResult;
use crate::keyed::Keyed;

/// Id-keyed entity store.
///
/// All implementations must satisfy these invariants:
/// - `put`, `get`, `remove`, and `modify` are atomic with respect to a
///   single key.
/// - The store never interprets entity contents beyond [`Keyed::key`].
/// - Lock and I/O failures are propagated, never silently ignored.
pub trait EntityStore<T: Keyed>: Send + Sync {
    /// Insert or replace an entity. Returns the previous value, if any.
    fn put(&self, entity: T) -> StoreResult<Option<T>>;

    /// Read an entity by key.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if the
    /// key is absent.
    fn get(&self, key: &T::Key) -> StoreResult<T>;

    /// Remove an entity by key. Returns `true` if it existed.
    fn remove(&self, key: &T::Key) -> StoreResult<bool>;

    /// Check whether a key is present.
    fn contains(&self, key: &T::Key) -> StoreResult<bool>;

    /// All keys, sorted.
    fn keys(&self) -> StoreResult<Vec<T::Key>>;

    /// All entities, sorted by key.
    fn values(&self) -> StoreResult<Vec<T>>;

    /// Number of stored entities.
    fn len(&self) -> StoreResult<usize>;

    /// Returns `true` if the store holds no entities.
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Mutate an entity in place under the store's write lock and return
    /// the updated value.
    fn modify<F>(&self, key: &T::Key, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut T),
        Self: Sized;

    /// Read several entities in key order of `keys`.
    ///
    /// Default implementation calls `get()` for each key and fails on the
    /// first missing one.
    fn get_many(&self, keys: &[T::Key]) -> StoreResult<Vec<T>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}
