//! In-memory [Datastore].

use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use bytes::Bytes;
use lru::LruCache;

use super::Datastore;
use crate::error::StorageError;
use crate::Context;

/// Default maximum number of entries in a [MemoryDatastore].
pub const MAX_VALUES: usize = 1000;

#[derive(Debug)]
/// An LRU bounded in-memory datastore.
///
/// Every operation holds a single lock, which gives per-key atomicity.
pub struct MemoryDatastore {
    values: Mutex<LruCache<String, Bytes>>,
}

impl Default for MemoryDatastore {
    fn default() -> Self {
        MemoryDatastore::new(NonZeroUsize::new(MAX_VALUES).unwrap_or(NonZeroUsize::MIN))
    }
}

impl MemoryDatastore {
    pub fn new(max_values: NonZeroUsize) -> Self {
        Self {
            values: Mutex::new(LruCache::new(max_values)),
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    fn values(&self) -> MutexGuard<'_, LruCache<String, Bytes>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Datastore for MemoryDatastore {
    fn get(&self, ctx: &Context, key: &str) -> Result<Bytes, StorageError> {
        ctx.check()?;

        self.values()
            .get(key)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn put(&self, ctx: &Context, key: &str, value: Bytes) -> Result<(), StorageError> {
        ctx.check()?;

        self.values().put(key.to_string(), value);

        Ok(())
    }

    fn delete(&self, ctx: &Context, key: &str) -> Result<(), StorageError> {
        ctx.check()?;

        self.values().pop(key);

        Ok(())
    }

    fn has(&self, ctx: &Context, key: &str) -> Result<bool, StorageError> {
        ctx.check()?;

        Ok(self.values().contains(key))
    }
}
