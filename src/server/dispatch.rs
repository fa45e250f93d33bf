//! Mapping from request type to handler.

use std::collections::HashMap;

use crate::common::{Message, MessageType, PeerId};
use crate::server::DefaultServer;
use crate::{Context, Result};

/// A request handler. `Ok(None)` means there is nothing to send back.
pub type Handler = fn(&DefaultServer, &Context, &PeerId, Message) -> Result<Option<Message>>;

#[derive(Debug, Clone, Default)]
/// Handlers by [MessageType]. Adding or replacing a handler is an insert.
pub struct HandlerTable {
    handlers: HashMap<MessageType, Handler>,
}

impl HandlerTable {
    /// A table without any handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// All six request types, served by [DefaultServer].
    pub fn with_defaults() -> Self {
        let mut table = Self::new();

        table.insert(MessageType::GetValue, DefaultServer::handle_get_value);
        table.insert(MessageType::PutValue, DefaultServer::handle_put_value);
        table.insert(MessageType::FindNode, DefaultServer::handle_find_peer);
        table.insert(MessageType::AddProvider, DefaultServer::handle_add_provider);
        table.insert(MessageType::GetProviders, DefaultServer::handle_get_providers);
        table.insert(MessageType::Ping, DefaultServer::handle_ping);

        table
    }

    /// Returns the handler previously registered for `message_type`, if any.
    pub fn insert(&mut self, message_type: MessageType, handler: Handler) -> Option<Handler> {
        self.handlers.insert(message_type, handler)
    }

    pub fn remove(&mut self, message_type: MessageType) -> Option<Handler> {
        self.handlers.remove(&message_type)
    }

    pub fn get(&self, message_type: MessageType) -> Option<Handler> {
        self.handlers.get(&message_type).copied()
    }

    /// Look up by wire tag, `None` for tags that aren't a known message type.
    pub fn get_by_tag(&self, tag: i32) -> Option<Handler> {
        self.get(MessageType::from_tag(tag)?)
    }
}
