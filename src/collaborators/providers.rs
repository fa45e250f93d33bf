//! Manage providers announced for content ids

use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use lru::LruCache;

use super::ProviderRegistry;
use crate::common::{ContentId, PeerId};
use crate::error::Cancelled;
use crate::Context;

// Stored data in server mode.
pub const MAX_CONTENT_IDS: usize = 2000;
pub const MAX_PROVIDERS: usize = 500;

#[derive(Debug)]
/// An LRU cache of providers per content id.
pub struct MemoryProviders {
    content_ids: Mutex<LruCache<ContentId, LruCache<PeerId, ()>>>,
    max_providers: NonZeroUsize,
}

impl Default for MemoryProviders {
    fn default() -> Self {
        MemoryProviders::new(
            NonZeroUsize::new(MAX_CONTENT_IDS).unwrap_or(NonZeroUsize::MIN),
            NonZeroUsize::new(MAX_PROVIDERS).unwrap_or(NonZeroUsize::MIN),
        )
    }
}

impl MemoryProviders {
    pub fn new(max_content_ids: NonZeroUsize, max_providers: NonZeroUsize) -> Self {
        Self {
            content_ids: Mutex::new(LruCache::new(max_content_ids)),
            max_providers,
        }
    }

    fn content_ids(&self) -> MutexGuard<'_, LruCache<ContentId, LruCache<PeerId, ()>>> {
        self.content_ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProviderRegistry for MemoryProviders {
    /// Most recently announced providers first.
    fn lookup(&self, ctx: &Context, cid: &ContentId) -> Result<Vec<PeerId>, Cancelled> {
        ctx.check()?;

        Ok(self
            .content_ids()
            .get(cid)
            .map(|providers| providers.iter().map(|(id, _)| id.clone()).collect())
            .unwrap_or_default())
    }

    fn register(&self, ctx: &Context, cid: &ContentId, provider: PeerId) -> Result<(), Cancelled> {
        ctx.check()?;

        let mut content_ids = self.content_ids();

        if let Some(providers) = content_ids.get_mut(cid) {
            providers.put(provider, ());
        } else {
            let mut providers = LruCache::new(self.max_providers);
            providers.put(provider, ());
            content_ids.put(cid.clone(), providers);
        };

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cid(byte: u8) -> ContentId {
        let mut key = vec![0x12, 0x20];
        key.extend([byte; 32]);
        ContentId::from_key(&key).unwrap()
    }

    #[test]
    fn max_content_ids() {
        let ctx = Context::new();
        let store = MemoryProviders::new(
            NonZeroUsize::new(1).unwrap(),
            NonZeroUsize::new(100).unwrap(),
        );

        let provider_a = PeerId::random();
        let provider_b = PeerId::random();

        store.register(&ctx, &cid(1), provider_a).unwrap();
        store.register(&ctx, &cid(2), provider_b.clone()).unwrap();

        assert!(store.lookup(&ctx, &cid(1)).unwrap().is_empty());
        assert_eq!(store.lookup(&ctx, &cid(2)).unwrap(), vec![provider_b]);
    }

    #[test]
    fn all_providers() {
        let ctx = Context::new();
        let store =
            MemoryProviders::new(NonZeroUsize::new(1).unwrap(), NonZeroUsize::new(2).unwrap());

        let a = PeerId::random();
        let b = PeerId::random();
        let c = PeerId::random();

        store.register(&ctx, &cid(1), a).unwrap();
        store.register(&ctx, &cid(1), b.clone()).unwrap();
        store.register(&ctx, &cid(1), c.clone()).unwrap();

        assert_eq!(store.lookup(&ctx, &cid(1)).unwrap(), vec![c, b]);
    }

    #[test]
    fn duplicate_registration() {
        let ctx = Context::new();
        let store = MemoryProviders::default();
        let a = PeerId::random();

        store.register(&ctx, &cid(1), a.clone()).unwrap();
        store.register(&ctx, &cid(1), a.clone()).unwrap();

        assert_eq!(store.lookup(&ctx, &cid(1)).unwrap(), vec![a]);
    }
}
