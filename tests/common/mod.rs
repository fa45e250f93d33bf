//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;

use cid::{multihash::Multihash, Cid};
use dashmap::DashMap;
use sha2::{Digest, Sha256};

use kad_server::{
    collaborators::{AddressBook, TtlClass, Validator},
    errors::{Cancelled, ValidationError},
    Connectedness, ContentId, Context, PeerId, PeerInfo,
};

const SHA2_256: u64 = 0x12;
const RAW: u64 = 0x55;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// CIDv0 of `data`.
pub fn cid_v0(data: &[u8]) -> ContentId {
    let digest = Sha256::digest(data);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest).unwrap();

    Cid::new_v0(hash).unwrap().into()
}

/// CIDv1 of `data`, raw codec.
pub fn cid_v1(data: &[u8]) -> ContentId {
    let digest = Sha256::digest(data);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest).unwrap();

    Cid::new_v1(RAW, hash).into()
}

pub fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, 1], port))
}

pub fn peer_info(id: &PeerId, port: u16) -> PeerInfo {
    PeerInfo::new(id.clone(), vec![addr(port)])
}

#[derive(Debug)]
/// Accepts everything, the incoming record always wins.
pub struct AcceptAll;

impl Validator for AcceptAll {
    fn validate(&self, _key: &[u8], _value: &[u8]) -> Result<(), ValidationError> {
        Ok(())
    }

    fn select(&self, _key: &[u8], _values: &[&[u8]]) -> Result<usize, ValidationError> {
        Ok(0)
    }
}

#[derive(Debug, Default)]
/// Address book remembering the TTL class of every upsert.
pub struct RecordingAddressBook {
    addrs: DashMap<PeerId, Vec<(SocketAddr, TtlClass)>>,
    connectedness: DashMap<PeerId, Connectedness>,
}

impl RecordingAddressBook {
    pub fn insert(&self, id: &PeerId, addr: SocketAddr) {
        self.addrs
            .entry(id.clone())
            .or_default()
            .push((addr, TtlClass::NormalProvider));
    }

    pub fn set_connectedness(&self, id: &PeerId, connectedness: Connectedness) {
        self.connectedness.insert(id.clone(), connectedness);
    }

    /// TTL classes `id`'s addresses were added with, in order.
    pub fn classes(&self, id: &PeerId) -> Vec<TtlClass> {
        self.addrs
            .get(id)
            .map(|entry| entry.iter().map(|(_, class)| *class).collect())
            .unwrap_or_default()
    }

    pub fn knows(&self, id: &PeerId) -> bool {
        self.addrs.contains_key(id)
    }
}

impl AddressBook for RecordingAddressBook {
    fn resolve(&self, ctx: &Context, ids: &[PeerId]) -> Result<Vec<PeerInfo>, Cancelled> {
        ctx.check()?;

        Ok(ids
            .iter()
            .map(|id| PeerInfo {
                id: id.clone(),
                addrs: self
                    .addrs
                    .get(id)
                    .map(|entry| entry.iter().map(|(addr, _)| *addr).collect())
                    .unwrap_or_default(),
                connection: self
                    .connectedness
                    .get(id)
                    .map(|c| *c)
                    .unwrap_or_default(),
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

        let mut entry = self.addrs.entry(id.clone()).or_default();
        entry.extend(addrs.iter().map(|addr| (*addr, ttl)));

        Ok(())
    }

    fn connectivity(&self, ctx: &Context, id: &PeerId) -> Result<Connectedness, Cancelled> {
        ctx.check()?;

        Ok(self
            .connectedness
            .get(id)
            .map(|c| *c)
            .unwrap_or_default())
    }
}
