//! Registering advertised providers and their addresses.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::collaborators::{AddressBook, ProviderRegistry, TtlClass};
use crate::common::{ContentId, PeerId, PeerInfo};
use crate::{Context, Result};

/// Chooses the address TTL class for a claimed provider identity.
pub trait ProviderClassifier: Debug + Send + Sync {
    fn classify(&self, provider: &PeerId) -> TtlClass;
}

#[derive(Debug, Default, Clone, Copy)]
/// Every provider is a normal provider.
pub struct DefaultClassifier;

impl ProviderClassifier for DefaultClassifier {
    fn classify(&self, _provider: &PeerId) -> TtlClass {
        TtlClass::NormalProvider
    }
}

#[derive(Debug, Clone)]
/// Provider ids starting with a marker prefix get [TtlClass::ExtendedProvider].
///
/// Applications use such ids as long lived pointers that aren't reachable peers
/// themselves.
pub struct PrefixClassifier {
    prefix: Bytes,
}

impl PrefixClassifier {
    pub fn new(prefix: impl Into<Bytes>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ProviderClassifier for PrefixClassifier {
    fn classify(&self, provider: &PeerId) -> TtlClass {
        if provider.as_bytes().starts_with(&self.prefix) {
            TtlClass::ExtendedProvider
        } else {
            TtlClass::NormalProvider
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
/// Outcome of [ProviderRecords::register].
pub enum Registration {
    Registered(TtlClass),
    /// The advertisement carried no addresses.
    Skipped,
}

#[derive(Debug, Clone)]
/// Provider associations plus the address bookkeeping that comes with them.
pub struct ProviderRecords {
    pub(crate) local_id: PeerId,
    pub(crate) registry: Arc<dyn ProviderRegistry>,
    pub(crate) address_book: Arc<dyn AddressBook>,
    pub(crate) classifier: Arc<dyn ProviderClassifier>,
}

impl ProviderRecords {
    pub fn new(
        local_id: PeerId,
        registry: Arc<dyn ProviderRegistry>,
        address_book: Arc<dyn AddressBook>,
        classifier: Arc<dyn ProviderClassifier>,
    ) -> Self {
        Self {
            local_id,
            registry,
            address_book,
            classifier,
        }
    }

    pub fn lookup(&self, ctx: &Context, cid: &ContentId) -> Result<Vec<PeerId>> {
        Ok(self.registry.lookup(ctx, cid)?)
    }

    /// Register `provider` for `cid`.
    ///
    /// The provider is the claimed identity in the advertisement, which may differ
    /// from the peer that sent it.
    pub fn register(
        &self,
        ctx: &Context,
        cid: &ContentId,
        provider: &PeerInfo,
    ) -> Result<Registration> {
        if provider.addrs.is_empty() {
            debug!(parent: ctx.span(), provider = %provider.id, "Provider without addresses, skipping");
            return Ok(Registration::Skipped);
        }

        let ttl = self.classifier.classify(&provider.id);

        debug!(parent: ctx.span(), provider = %provider.id, addrs = ?provider.addrs, ?ttl, "Received provider");

        // Don't add own addrs.
        if provider.id != self.local_id {
            self.address_book
                .add_addrs(ctx, &provider.id, &provider.addrs, ttl)?;
        }

        self.registry.register(ctx, cid, provider.id.clone())?;

        Ok(Registration::Registered(ttl))
    }
}
