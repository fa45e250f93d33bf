//! Interfaces of everything the request handlers depend on, with in-memory
//! implementations.
//!
//! Every call that may block takes the request [Context] and must return promptly
//! with a cancellation error once it is cancelled.

mod address_book;
mod datastore;
mod providers;
mod routing_table;

pub use address_book::*;
pub use datastore::*;
pub use providers::*;
pub use routing_table::*;

use std::{fmt::Debug, net::SocketAddr};

use bytes::Bytes;

use crate::common::{Connectedness, ContentId, PeerId, PeerInfo};
use crate::error::{Cancelled, StorageError, ValidationError};
use crate::Context;

/// Persistent key value storage.
///
/// A single get, put or delete must be atomic for its key.
pub trait Datastore: Debug + Send + Sync {
    /// Returns [StorageError::NotFound] for missing keys.
    fn get(&self, ctx: &Context, key: &str) -> Result<Bytes, StorageError>;

    fn put(&self, ctx: &Context, key: &str, value: Bytes) -> Result<(), StorageError>;

    fn delete(&self, ctx: &Context, key: &str) -> Result<(), StorageError>;

    fn has(&self, ctx: &Context, key: &str) -> Result<bool, StorageError>;
}

/// Record semantics: what a valid record is, and which of two records is better.
pub trait Validator: Debug + Send + Sync {
    fn validate(&self, key: &[u8], value: &[u8]) -> Result<(), ValidationError>;

    /// Index of the best value in `values`.
    fn select(&self, key: &[u8], values: &[&[u8]]) -> Result<usize, ValidationError>;
}

/// Kademlia routing table.
pub trait RoutingTable: Debug + Send + Sync {
    /// Up to `limit` peers closer to `target` than the local node, never `exclude`.
    fn closer_peers(
        &self,
        ctx: &Context,
        target: &[u8],
        exclude: &PeerId,
        limit: usize,
    ) -> Result<Vec<PeerId>, Cancelled>;
}

/// TTL bucket requested for addresses learned from a provider advertisement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlClass {
    NormalProvider,
    /// Longer lived binding, for provider identities that aren't real peers.
    ExtendedProvider,
}

/// Peer addresses and connection state.
pub trait AddressBook: Debug + Send + Sync {
    /// Known addresses for each id, in order. Ids without addresses are still returned.
    fn resolve(&self, ctx: &Context, ids: &[PeerId]) -> Result<Vec<PeerInfo>, Cancelled>;

    /// Upsert `addrs`; how they merge with existing entries is up to the book.
    fn add_addrs(
        &self,
        ctx: &Context,
        id: &PeerId,
        addrs: &[SocketAddr],
        ttl: TtlClass,
    ) -> Result<(), Cancelled>;

    fn connectivity(&self, ctx: &Context, id: &PeerId) -> Result<Connectedness, Cancelled>;
}

/// Content id to provider associations.
pub trait ProviderRegistry: Debug + Send + Sync {
    fn lookup(&self, ctx: &Context, cid: &ContentId) -> Result<Vec<PeerId>, Cancelled>;

    fn register(&self, ctx: &Context, cid: &ContentId, provider: PeerId) -> Result<(), Cancelled>;
}
