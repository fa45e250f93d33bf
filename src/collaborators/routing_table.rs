//! Simplified in-memory Kademlia routing table

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::RoutingTable;
use crate::common::{Id, PeerId};
use crate::config::MAX_BUCKET_SIZE_K;
use crate::error::Cancelled;
use crate::Context;

#[derive(Debug)]
/// Routing table that keeps up to [MAX_BUCKET_SIZE_K] peers per distance from the local id.
pub struct MemoryRoutingTable {
    id: PeerId,
    local: Id,
    buckets: RwLock<BTreeMap<u8, Vec<PeerId>>>,
}

impl MemoryRoutingTable {
    /// Create a new [MemoryRoutingTable] with a given local id.
    pub fn new(id: PeerId) -> Self {
        Self {
            local: id.keyspace(),
            id,
            buckets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Returns the [PeerId] of this node, where the distance is measured from.
    pub fn id(&self) -> &PeerId {
        &self.id
    }

    /// Attempts to add a peer to this routing table, and return `true` if it did.
    pub fn add(&self, peer: PeerId) -> bool {
        let distance = self.local.distance(&peer.keyspace());

        if distance == 0 || peer == self.id {
            // Do not add self to the routing_table
            return false;
        }

        let mut buckets = self.write();
        let bucket = buckets.entry(distance).or_default();

        if bucket.contains(&peer) || bucket.len() >= MAX_BUCKET_SIZE_K {
            return false;
        }

        bucket.push(peer);
        true
    }

    /// Remove a peer from this routing table.
    pub fn remove(&self, peer: &PeerId) {
        let distance = self.local.distance(&peer.keyspace());

        if let Some(bucket) = self.write().get_mut(&distance) {
            bucket.retain(|p| p != peer)
        }
    }

    /// Return the number of peers in this routing table.
    pub fn size(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<u8, Vec<PeerId>>> {
        self.buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<u8, Vec<PeerId>>> {
        self.buckets.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoutingTable for MemoryRoutingTable {
    fn closer_peers(
        &self,
        ctx: &Context,
        target: &[u8],
        exclude: &PeerId,
        limit: usize,
    ) -> Result<Vec<PeerId>, Cancelled> {
        ctx.check()?;

        let target = Id::hash(target);
        let local_distance = self.local.xor(&target);

        let mut closer: Vec<(Id, PeerId)> = self
            .read()
            .values()
            .flatten()
            .filter(|peer| *peer != exclude)
            .map(|peer| (peer.keyspace().xor(&target), peer.clone()))
            .filter(|(distance, _)| *distance < local_distance)
            .collect();

        closer.sort_by(|a, b| a.0.cmp(&b.0));
        closer.truncate(limit);

        Ok(closer.into_iter().map(|(_, peer)| peer).collect())
    }
}
