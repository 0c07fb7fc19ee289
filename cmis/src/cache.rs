//! Session object cache.
//!
//! Entries are keyed by object id, then by the cache key of the
//! [`crate::context::OperationContext`] the object was fetched with.
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use crate::object::{Object, ObjectId};

/// Look up an object in the cache.
pub trait Get<T> {
    /// Get the entry for `id` that was fetched with a context matching `key`.
    fn get(&self, id: &ObjectId, key: &str) -> Option<Arc<T>>;
    /// Whether any entry exists for `id`.
    fn contains(&self, id: &ObjectId) -> bool;
}

/// Update an object in the cache.
pub trait Update<T> {
    /// The output type, if any, for a successful update.
    type Out;
    type UpdateError: std::error::Error + Send + Sync + 'static;

    fn update(
        &mut self,
        id: &ObjectId,
        key: &str,
        object: Arc<T>,
    ) -> Result<Self::Out, Self::UpdateError>;
}

/// Remove an object from the cache.
pub trait Remove<T> {
    /// The output type, if any, for a successful removal.
    type Out;
    type RemoveError: std::error::Error + Send + Sync + 'static;

    /// Delete every entry for `id`, regardless of context.
    fn remove(&mut self, id: &ObjectId) -> Result<Self::Out, Self::RemoveError>;
    /// Delete all entries.
    fn remove_all(&mut self) -> Result<Self::Out, Self::RemoveError>;
}

/// A cache the [`crate::Session`] can read, update, and evict from.
pub trait ObjectCache: Get<Object> + Update<Object> + Remove<Object> {}

impl<T> ObjectCache for T where T: Get<Object> + Update<Object> + Remove<Object> {}

/// An in-memory cache for storing objects.
#[derive(Clone, Debug)]
pub struct InMemory<T> {
    inner: HashMap<ObjectId, HashMap<String, Arc<T>>>,
}

impl<T> Default for InMemory<T> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<T> InMemory<T> {
    /// Number of cached object ids.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> Get<T> for InMemory<T> {
    fn get(&self, id: &ObjectId, key: &str) -> Option<Arc<T>> {
        self.inner.get(id).and_then(|e| e.get(key)).cloned()
    }

    fn contains(&self, id: &ObjectId) -> bool {
        self.inner.contains_key(id)
    }
}

impl<T> Update<T> for InMemory<T> {
    type Out = Option<Arc<T>>;
    type UpdateError = Infallible;

    fn update(
        &mut self,
        id: &ObjectId,
        key: &str,
        object: Arc<T>,
    ) -> Result<Self::Out, Self::UpdateError> {
        let entries = self.inner.entry(id.clone()).or_default();
        Ok(entries.insert(key.to_owned(), object))
    }
}

impl<T> Remove<T> for InMemory<T> {
    type Out = bool;
    type RemoveError = Infallible;

    fn remove(&mut self, id: &ObjectId) -> Result<Self::Out, Self::RemoveError> {
        Ok(self.inner.remove(id).is_some())
    }

    fn remove_all(&mut self) -> Result<Self::Out, Self::RemoveError> {
        let removed = !self.inner.is_empty();
        self.inner.clear();

        Ok(removed)
    }
}

/// The `/dev/null` of caches.
///
/// It will ignore any updates, and miss on every lookup.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl<T> Get<T> for NoCache {
    fn get(&self, _id: &ObjectId, _key: &str) -> Option<Arc<T>> {
        None
    }

    fn contains(&self, _id: &ObjectId) -> bool {
        false
    }
}

impl<T> Update<T> for NoCache {
    type Out = ();
    type UpdateError = Infallible;

    fn update(
        &mut self,
        _id: &ObjectId,
        _key: &str,
        _object: Arc<T>,
    ) -> Result<Self::Out, Self::UpdateError> {
        Ok(())
    }
}

impl<T> Remove<T> for NoCache {
    type Out = ();
    type RemoveError = Infallible;

    fn remove(&mut self, _id: &ObjectId) -> Result<Self::Out, Self::RemoveError> {
        Ok(())
    }

    fn remove_all(&mut self) -> Result<Self::Out, Self::RemoveError> {
        Ok(())
    }
}
