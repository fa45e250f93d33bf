//! Responding to incoming DHT requests.

mod admission;
mod closer;
mod dispatch;
mod handlers;
mod providers;
mod records;

pub use admission::*;
pub use closer::*;
pub use dispatch::*;
pub use providers::*;
pub use records::*;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::debug;

use crate::collaborators::{
    AddressBook, Datastore, MemoryAddressBook, MemoryDatastore, MemoryProviders,
    MemoryRoutingTable, ProviderRegistry, RoutingTable, Validator,
};
use crate::common::{Message, PeerId, PeerInfo};
use crate::config::Config;
use crate::time::{SystemTimeSource, TimeSource};
use crate::{Context, Error, Result};

/// Dht server that can handle incoming requests
pub trait Server: std::fmt::Debug + Send + Sync {
    /// Handle an incoming request from `from`.
    ///
    /// Returns:
    /// - `Ok(Some(response))` to send back to the requester.
    /// - `Ok(None)` when there is nothing to send back.
    /// - `Err(_)` when the request failed; the protocol has no error payload, so
    ///   callers usually drop the request.
    ///
    /// Implementations must be safe to call concurrently for any number of requests.
    fn handle_request(&self, ctx: &Context, from: &PeerId, request: Message)
        -> Result<Option<Message>>;
}

#[derive(Debug)]
/// Default implementation of [Server] trait.
///
/// Holds no per-request state: every handler works only through its collaborators,
/// which are shared behind [Arc]s.
pub struct DefaultServer {
    local_id: PeerId,
    local_addrs: Vec<SocketAddr>,
    config: Config,
    records: RecordStore,
    providers: ProviderRecords,
    closer: CloserPeers,
    address_book: Arc<dyn AddressBook>,
    handlers: HandlerTable,
}

impl DefaultServer {
    /// Start building a server for the node identified by `local_id`.
    pub fn builder(local_id: PeerId) -> ServerBuilder {
        ServerBuilder::new(local_id)
    }

    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    /// Addresses this node listens on, as given to [ServerBuilder::local_addrs].
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn providers(&self) -> &ProviderRecords {
        &self.providers
    }

    pub fn closer(&self) -> &CloserPeers {
        &self.closer
    }

    /// The handler for a request type tag, `None` if nothing handles it.
    pub fn handler_for(&self, tag: i32) -> Option<Handler> {
        self.handlers.get_by_tag(tag)
    }

    /// Our own [PeerInfo]: whatever the address book knows plus the configured local addresses.
    pub(crate) fn local_peer_info(&self, ctx: &Context) -> Result<PeerInfo> {
        let mut info = self
            .address_book
            .resolve(ctx, std::slice::from_ref(&self.local_id))?
            .into_iter()
            .next()
            .unwrap_or_else(|| PeerInfo::new(self.local_id.clone(), vec![]));

        for addr in &self.local_addrs {
            if !info.addrs.contains(addr) {
                info.addrs.push(*addr);
            }
        }

        Ok(info)
    }
}

impl Server for DefaultServer {
    fn handle_request(
        &self,
        ctx: &Context,
        from: &PeerId,
        request: Message,
    ) -> Result<Option<Message>> {
        match self.handlers.get(request.message_type) {
            Some(handler) => handler(self, ctx, from, request),
            None => {
                debug!(parent: ctx.span(), message_type = ?request.message_type, peer = %from, "No handler, dropping request");
                Ok(None)
            }
        }
    }
}

#[derive(Debug)]
/// Builder for [DefaultServer].
///
/// Only the [Validator] is required; every other collaborator defaults to its
/// in-memory implementation.
pub struct ServerBuilder {
    local_id: PeerId,
    local_addrs: Vec<SocketAddr>,
    config: Config,
    datastore: Option<Arc<dyn Datastore>>,
    validator: Option<Arc<dyn Validator>>,
    routing_table: Option<Arc<dyn RoutingTable>>,
    address_book: Option<Arc<dyn AddressBook>>,
    providers: Option<Arc<dyn ProviderRegistry>>,
    classifier: Option<Arc<dyn ProviderClassifier>>,
    time: Option<Arc<dyn TimeSource>>,
    handlers: Option<HandlerTable>,
}

impl ServerBuilder {
    fn new(local_id: PeerId) -> Self {
        Self {
            local_id,
            local_addrs: vec![],
            config: Config::default(),
            datastore: None,
            validator: None,
            routing_table: None,
            address_book: None,
            providers: None,
            classifier: None,
            time: None,
            handlers: None,
        }
    }

    /// Addresses this node is reachable at.
    ///
    /// Reported whenever the node lists itself, in a FIND_NODE for its own id or
    /// as a provider of locally stored content.
    pub fn local_addrs(mut self, addrs: Vec<SocketAddr>) -> Self {
        self.local_addrs = addrs;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn datastore(mut self, datastore: Arc<dyn Datastore>) -> Self {
        self.datastore = Some(datastore);
        self
    }

    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn routing_table(mut self, routing_table: Arc<dyn RoutingTable>) -> Self {
        self.routing_table = Some(routing_table);
        self
    }

    pub fn address_book(mut self, address_book: Arc<dyn AddressBook>) -> Self {
        self.address_book = Some(address_book);
        self
    }

    pub fn providers(mut self, providers: Arc<dyn ProviderRegistry>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn ProviderClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = Some(time);
        self
    }

    /// Replace the default [HandlerTable::with_defaults].
    pub fn handlers(mut self, handlers: HandlerTable) -> Self {
        self.handlers = Some(handlers);
        self
    }

    pub fn build(self) -> Result<DefaultServer> {
        let validator = self
            .validator
            .ok_or(Error::BuilderMissingField("validator"))?;

        let local_id = self.local_id;

        let datastore = self
            .datastore
            .unwrap_or_else(|| Arc::new(MemoryDatastore::default()));
        let routing_table = self
            .routing_table
            .unwrap_or_else(|| Arc::new(MemoryRoutingTable::new(local_id.clone())));
        let address_book = self
            .address_book
            .unwrap_or_else(|| Arc::new(MemoryAddressBook::default()));
        let providers = self
            .providers
            .unwrap_or_else(|| Arc::new(MemoryProviders::default()));
        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(DefaultClassifier));
        let time = self.time.unwrap_or_else(|| Arc::new(SystemTimeSource));

        Ok(DefaultServer {
            records: RecordStore::new(datastore, validator, time, self.config.max_record_age),
            providers: ProviderRecords::new(
                local_id.clone(),
                providers,
                address_book.clone(),
                classifier,
            ),
            closer: CloserPeers::new(local_id.clone(), routing_table, address_book.clone()),
            address_book,
            handlers: self.handlers.unwrap_or_else(HandlerTable::with_defaults),
            config: self.config,
            local_addrs: self.local_addrs,
            local_id,
        })
    }
}
