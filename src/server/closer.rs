//! Peers to point a requester at.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::collaborators::{AddressBook, RoutingTable};
use crate::common::{PeerId, PeerInfo};
use crate::{Context, Result};

#[derive(Debug, Clone)]
/// Closer peers from the routing table, resolved to routable [PeerInfo]s.
pub struct CloserPeers {
    pub(crate) local_id: PeerId,
    pub(crate) routing_table: Arc<dyn RoutingTable>,
    pub(crate) address_book: Arc<dyn AddressBook>,
}

impl CloserPeers {
    pub fn new(
        local_id: PeerId,
        routing_table: Arc<dyn RoutingTable>,
        address_book: Arc<dyn AddressBook>,
    ) -> Self {
        Self {
            local_id,
            routing_table,
            address_book,
        }
    }

    /// Up to `limit` peers closer to `target` than us, never `exclude`, all with addresses.
    pub fn closer_peers(
        &self,
        ctx: &Context,
        target: &[u8],
        exclude: &PeerId,
        limit: usize,
    ) -> Result<Vec<PeerInfo>> {
        let ids = self.closer_peer_ids(ctx, target, exclude, limit)?;

        self.routable(ctx, &ids)
    }

    /// Ids only, as returned by the routing table minus the requester.
    ///
    /// If the routing table ever hands back our own id the whole answer is
    /// considered broken and dropped.
    pub fn closer_peer_ids(
        &self,
        ctx: &Context,
        target: &[u8],
        exclude: &PeerId,
        limit: usize,
    ) -> Result<Vec<PeerId>> {
        let closer = self
            .routing_table
            .closer_peers(ctx, target, exclude, limit)?;

        if closer.contains(&self.local_id) {
            warn!(parent: ctx.span(), "Routing table returned self as a closer peer");
            return Ok(vec![]);
        }

        Ok(closer.into_iter().filter(|id| id != exclude).collect())
    }

    /// Resolve `ids` and keep only the ones that have addresses.
    pub fn routable(&self, ctx: &Context, ids: &[PeerId]) -> Result<Vec<PeerInfo>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let infos = self.address_book.resolve(ctx, ids)?;

        Ok(infos
            .into_iter()
            .filter(|info| {
                if !info.is_routable() {
                    debug!(parent: ctx.span(), peer = %info.id, "No addresses on closer peer, dropping");
                }
                info.is_routable()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;

    use crate::collaborators::MemoryAddressBook;
    use crate::error::Cancelled;

    #[derive(Debug)]
    struct FixedTable(Vec<PeerId>);

    impl RoutingTable for FixedTable {
        fn closer_peers(
            &self,
            _ctx: &Context,
            _target: &[u8],
            _exclude: &PeerId,
            limit: usize,
        ) -> Result<Vec<PeerId>, Cancelled> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    fn addr() -> SocketAddr {
        "10.0.0.1:4001".parse().unwrap()
    }

    #[test]
    fn drops_peers_without_addresses() {
        let ctx = Context::new();
        let with_addrs = PeerId::random();
        let without_addrs = PeerId::random();

        let book = Arc::new(MemoryAddressBook::default());
        book.add_addrs_with_ttl(&with_addrs, &[addr()], std::time::Duration::from_secs(60));

        let selector = CloserPeers::new(
            PeerId::random(),
            Arc::new(FixedTable(vec![with_addrs.clone(), without_addrs])),
            book,
        );

        let closer = selector
            .closer_peers(&ctx, b"target", &PeerId::random(), 20)
            .unwrap();

        assert_eq!(closer.len(), 1);
        assert_eq!(closer[0].id, with_addrs);
        assert_eq!(closer[0].addrs, vec![addr()]);
    }

    #[test]
    fn never_returns_requester() {
        let ctx = Context::new();
        let requester = PeerId::random();

        let selector = CloserPeers::new(
            PeerId::random(),
            Arc::new(FixedTable(vec![requester.clone(), PeerId::random()])),
            Arc::new(MemoryAddressBook::default()),
        );

        let ids = selector
            .closer_peer_ids(&ctx, b"target", &requester, 20)
            .unwrap();

        assert_eq!(ids.len(), 1);
        assert!(!ids.contains(&requester));
    }

    #[test]
    fn self_in_results_drops_everything() {
        let ctx = Context::new();
        let local = PeerId::random();

        let selector = CloserPeers::new(
            local.clone(),
            Arc::new(FixedTable(vec![PeerId::random(), local])),
            Arc::new(MemoryAddressBook::default()),
        );

        assert!(selector
            .closer_peer_ids(&ctx, b"target", &PeerId::random(), 20)
            .unwrap()
            .is_empty());
    }
}
