//! Request handlers

use tracing::{debug, debug_span, info};

use crate::common::{ContentId, Message, PeerId};
use crate::server::{Admission, DefaultServer};
use crate::{Context, Error, Result};

impl DefaultServer {
    /// GET_VALUE: the local record if it is fresh, plus closer peers.
    ///
    /// The record is not validated, that is left to the requester.
    pub fn handle_get_value(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        let ctx = ctx.scoped(debug_span!(parent: ctx.span(), "handle_get_value", peer = %from));
        let _entered = ctx.span().enter();
        ctx.check()?;

        if request.key.is_empty() {
            return Err(Error::RequestMalformed("get_value without a key"));
        }

        debug!(key = ?request.key, "Looking up record");

        let mut response = Message::response_to(&request, request.key.clone());

        response.record = self.records.lookup(&ctx, &request.key)?;
        response.closer_peers =
            self.closer
                .closer_peers(&ctx, &request.key, from, self.config.k)?;

        Ok(Some(response))
    }

    /// PUT_VALUE: store the record if it beats what we have, echo the request back.
    pub fn handle_put_value(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        let ctx = ctx.scoped(debug_span!(parent: ctx.span(), "handle_put_value", peer = %from));
        let _entered = ctx.span().enter();
        ctx.check()?;

        let mut record = match &request.record {
            Some(record) => record.clone(),
            None => {
                info!("Put request without a record");
                return Err(Error::RequestMalformed("put_value without a record"));
            }
        };

        if record.key != request.key {
            return Err(Error::RequestMalformed("put key doesn't match record key"));
        }

        match self.records.admit(&ctx, &request.key, &mut record)? {
            Admission::Accept => {}
            Admission::Reject(rejection) => return Err(rejection.into()),
        }

        // Nothing has been written yet, a cancelled put leaves the store untouched.
        ctx.check()?;

        // Receipt time is always local.
        record.stamp_received(self.records.time.now());

        self.records.store(&ctx, &record)?;
        debug!(key = ?request.key, "Record accepted");

        Ok(Some(request))
    }

    /// FIND_NODE: peers closer to the target id, plus the target itself if we can reach it.
    pub fn handle_find_peer(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        let ctx = ctx.scoped(debug_span!(parent: ctx.span(), "handle_find_peer", peer = %from));
        let _entered = ctx.span().enter();
        ctx.check()?;

        let mut response = Message::response_to(&request, Default::default());
        let target = PeerId::from(&request.key[..]);

        // Looking for us, answer with ourselves.
        if target == self.local_id {
            let local = self.local_peer_info(&ctx)?;

            if local.is_routable() {
                response.closer_peers = vec![local];
            } else {
                debug!("No local addresses to report");
            }

            return Ok(Some(response));
        }

        let mut closest = self
            .closer
            .closer_peer_ids(&ctx, &request.key, from, self.config.k)?;

        // Never tell a peer about itself.
        if &target != from && !closest.contains(&target) {
            // A reachable target is reported even if the routing table doesn't know it.
            if self.address_book.connectivity(&ctx, &target)?.is_reachable() {
                closest.push(target);
            }
        }

        if closest.is_empty() {
            debug!("No closer peers to report");
            return Ok(Some(response));
        }

        response.closer_peers = self.closer.routable(&ctx, &closest)?;

        Ok(Some(response))
    }

    /// GET_PROVIDERS: known providers for a content id, plus closer peers.
    pub fn handle_get_providers(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        let ctx = ctx.scoped(debug_span!(parent: ctx.span(), "handle_get_providers", peer = %from));
        let _entered = ctx.span().enter();
        ctx.check()?;

        let cid = ContentId::from_key(&request.key)?;
        debug!(%cid, "Looking up providers");

        let mut response = Message::response_to(&request, request.key.clone());

        let mut providers = self.providers.lookup(&ctx, &cid)?;

        // We provide what we store.
        if self.records.has(&ctx, &cid.to_bytes())? && !providers.contains(&self.local_id) {
            providers.push(self.local_id.clone());
            debug!(%cid, "Content stored locally, listing self as provider");
        }

        if !providers.is_empty() {
            response.provider_peers = self.address_book.resolve(&ctx, &providers)?;

            if let Some(local) = response
                .provider_peers
                .iter_mut()
                .find(|provider| provider.id == self.local_id)
            {
                *local = self.local_peer_info(&ctx)?;
            }

            debug!(%cid, count = providers.len(), "Found providers");
        }

        response.closer_peers =
            self.closer
                .closer_peers(&ctx, &request.key, from, self.config.k)?;
        debug!(%cid, count = response.closer_peers.len(), "Found closer peers");

        Ok(Some(response))
    }

    /// ADD_PROVIDER: register every advertised provider that came with addresses.
    ///
    /// There is no response payload.
    pub fn handle_add_provider(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        let ctx = ctx.scoped(debug_span!(parent: ctx.span(), "handle_add_provider", peer = %from));
        let _entered = ctx.span().enter();
        ctx.check()?;

        let cid = ContentId::from_key(&request.key)?;
        debug!(%cid, count = request.provider_peers.len(), "Adding providers");

        for provider in &request.provider_peers {
            self.providers.register(&ctx, &cid, provider)?;
        }

        Ok(None)
    }

    /// PING: echo the request.
    pub fn handle_ping(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        let ctx = ctx.scoped(debug_span!(parent: ctx.span(), "handle_ping", peer = %from));
        let _entered = ctx.span().enter();
        ctx.check()?;

        debug!("Responding to ping");

        Ok(Some(request))
    }
}
