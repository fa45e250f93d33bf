//! In-memory [AddressBook] with per-address expiry.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::{Duration, Instant},
};

use super::{AddressBook, TtlClass};
use crate::common::{Connectedness, PeerId, PeerInfo};
use crate::error::Cancelled;
use crate::Context;

/// How long addresses learned from a provider advertisement are kept.
pub const PROVIDER_ADDR_TTL: Duration = Duration::from_secs(10 * 60);
/// How long addresses of [TtlClass::ExtendedProvider] identities are kept.
pub const EXTENDED_PROVIDER_ADDR_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct AddressBookSettings {
    /// Defaults to [PROVIDER_ADDR_TTL]
    pub provider_addr_ttl: Duration,
    /// Defaults to [EXTENDED_PROVIDER_ADDR_TTL]
    pub extended_provider_addr_ttl: Duration,
}

impl Default for AddressBookSettings {
    fn default() -> Self {
        Self {
            provider_addr_ttl: PROVIDER_ADDR_TTL,
            extended_provider_addr_ttl: EXTENDED_PROVIDER_ADDR_TTL,
        }
    }
}

impl AddressBookSettings {
    pub fn ttl(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::NormalProvider => self.provider_addr_ttl,
            TtlClass::ExtendedProvider => self.extended_provider_addr_ttl,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Expiry {
    ttl: Duration,
    expires: Instant,
}

#[derive(Debug, Default)]
struct Entry {
    addrs: HashMap<SocketAddr, Expiry>,
    connectedness: Connectedness,
}

#[derive(Debug, Default)]
/// Address book keeping each address until its TTL runs out.
///
/// Re-adding an address only ever extends its expiry.
pub struct MemoryAddressBook {
    settings: AddressBookSettings,
    peers: RwLock<HashMap<PeerId, Entry>>,
}

impl MemoryAddressBook {
    pub fn new(settings: AddressBookSettings) -> Self {
        Self {
            settings,
            peers: RwLock::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &AddressBookSettings {
        &self.settings
    }

    /// Add addresses with an explicit TTL, e.g. for peers learned outside of provider records.
    pub fn add_addrs_with_ttl(&self, id: &PeerId, addrs: &[SocketAddr], ttl: Duration) {
        let now = Instant::now();
        let mut peers = self.write();
        let entry = peers.entry(id.clone()).or_default();

        for addr in addrs {
            let candidate = Expiry {
                ttl,
                expires: now + ttl,
            };

            entry
                .addrs
                .entry(*addr)
                .and_modify(|current| {
                    if candidate.expires > current.expires {
                        *current = candidate
                    }
                })
                .or_insert(candidate);
        }
    }

    pub fn set_connectedness(&self, id: &PeerId, connectedness: Connectedness) {
        self.write().entry(id.clone()).or_default().connectedness = connectedness;
    }

    /// Live addresses of `id` and the TTL each was last extended with.
    pub fn ttls(&self, id: &PeerId) -> Vec<(SocketAddr, Duration)> {
        let now = Instant::now();

        self.read()
            .get(id)
            .map(|entry| {
                entry
                    .addrs
                    .iter()
                    .filter(|(_, expiry)| expiry.expires > now)
                    .map(|(addr, expiry)| (*addr, expiry.ttl))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<PeerId, Entry>> {
        self.peers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PeerId, Entry>> {
        self.peers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AddressBook for MemoryAddressBook {
    fn resolve(&self, ctx: &Context, ids: &[PeerId]) -> Result<Vec<PeerInfo>, Cancelled> {
        ctx.check()?;

        let now = Instant::now();
        let peers = self.read();

        Ok(ids
            .iter()
            .map(|id| match peers.get(id) {
                Some(entry) => {
                    let mut addrs: Vec<SocketAddr> = entry
                        .addrs
                        .iter()
                        .filter(|(_, expiry)| expiry.expires > now)
                        .map(|(addr, _)| *addr)
                        .collect();
                    addrs.sort();

                    PeerInfo {
                        id: id.clone(),
                        addrs,
                        connection: entry.connectedness,
                    }
                }
                None => PeerInfo::new(id.clone(), vec![]),
            })
            .collect())
    }

    fn add_addrs(
        &self,
        ctx: &Context,
        id: &PeerId,
        addrs: &[SocketAddr],
        ttl: TtlClass,
    ) -> Result<(), Cancelled> {
        ctx.check()?;

        self.add_addrs_with_ttl(id, addrs, self.settings.ttl(ttl));

        Ok(())
    }

    fn connectivity(&self, ctx: &Context, id: &PeerId) -> Result<Connectedness, Cancelled> {
        ctx.check()?;

        Ok(self
            .read()
            .get(id)
            .map(|entry| entry.connectedness)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn resolve_unknown_peer() {
        let book = MemoryAddressBook::default();
        let id = PeerId::random();

        let infos = book.resolve(&Context::new(), &[id.clone()]).unwrap();

        assert_eq!(infos, vec![PeerInfo::new(id, vec![])]);
    }

    #[test]
    fn ttl_by_class() {
        let ctx = Context::new();
        let book = MemoryAddressBook::default();
        let normal = PeerId::random();
        let extended = PeerId::random();

        book.add_addrs(&ctx, &normal, &[addr(1)], TtlClass::NormalProvider)
            .unwrap();
        book.add_addrs(&ctx, &extended, &[addr(2)], TtlClass::ExtendedProvider)
            .unwrap();

        assert_eq!(book.ttls(&normal), vec![(addr(1), PROVIDER_ADDR_TTL)]);
        assert_eq!(book.ttls(&extended), vec![(addr(2), EXTENDED_PROVIDER_ADDR_TTL)]);
    }

    #[test]
    fn merge_keeps_later_expiry() {
        let ctx = Context::new();
        let book = MemoryAddressBook::default();
        let id = PeerId::random();

        book.add_addrs(&ctx, &id, &[addr(1)], TtlClass::ExtendedProvider)
            .unwrap();
        book.add_addrs(&ctx, &id, &[addr(1)], TtlClass::NormalProvider)
            .unwrap();

        assert_eq!(book.ttls(&id), vec![(addr(1), EXTENDED_PROVIDER_ADDR_TTL)]);
    }

    #[test]
    fn expired_addresses_are_not_resolved() {
        let book = MemoryAddressBook::default();
        let id = PeerId::random();

        book.add_addrs_with_ttl(&id, &[addr(1)], Duration::ZERO);

        let infos = book.resolve(&Context::new(), &[id]).unwrap();
        assert!(infos[0].addrs.is_empty());
    }

    #[test]
    fn connectivity() {
        let ctx = Context::new();
        let book = MemoryAddressBook::default();
        let id = PeerId::random();

        assert_eq!(book.connectivity(&ctx, &id).unwrap(), Connectedness::Unknown);

        book.set_connectedness(&id, Connectedness::Connected);
        book.add_addrs_with_ttl(&id, &[addr(1)], Duration::from_secs(60));

        assert_eq!(book.connectivity(&ctx, &id).unwrap(), Connectedness::Connected);
        assert_eq!(
            book.resolve(&ctx, &[id]).unwrap()[0].connection,
            Connectedness::Connected
        );
    }
}
