//! Serialize and deserialize DHT request and response messages.

mod internal;

use bytes::Bytes;

use crate::common::{bytes_to_sockaddr, sockaddr_to_bytes, Connectedness, PeerId, PeerInfo, Record};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// The six request types. Responses reuse the type of their request.
pub enum MessageType {
    PutValue,
    GetValue,
    AddProvider,
    GetProviders,
    FindNode,
    Ping,
}

impl MessageType {
    pub const ALL: [MessageType; 6] = [
        MessageType::PutValue,
        MessageType::GetValue,
        MessageType::AddProvider,
        MessageType::GetProviders,
        MessageType::FindNode,
        MessageType::Ping,
    ];

    /// Wire tag of this message type.
    pub fn tag(&self) -> i32 {
        match self {
            MessageType::PutValue => 0,
            MessageType::GetValue => 1,
            MessageType::AddProvider => 2,
            MessageType::GetProviders => 3,
            MessageType::FindNode => 4,
            MessageType::Ping => 5,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        MessageType::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl TryFrom<i32> for MessageType {
    type Error = Error;

    fn try_from(tag: i32) -> Result<Self> {
        MessageType::from_tag(tag).ok_or(Error::UnknownMessageType(tag))
    }
}

#[derive(Debug, PartialEq, Clone)]
/// Request and response envelope.
pub struct Message {
    pub message_type: MessageType,
    pub key: Bytes,
    /// Opaque hint for the routing table, echoed back in responses.
    pub cluster_level: i32,
    pub record: Option<Record>,
    pub closer_peers: Vec<PeerInfo>,
    pub provider_peers: Vec<PeerInfo>,
}

impl Message {
    pub fn new(message_type: MessageType, key: impl Into<Bytes>, cluster_level: i32) -> Self {
        Self {
            message_type,
            key: key.into(),
            cluster_level,
            record: None,
            closer_peers: vec![],
            provider_peers: vec![],
        }
    }

    /// An empty response of the same type and cluster level as `request`, for `key`.
    pub fn response_to(request: &Message, key: Bytes) -> Self {
        Self::new(request.message_type, key, request.cluster_level)
    }

    pub fn with_record(mut self, record: Record) -> Self {
        self.record = Some(record);
        self
    }

    pub fn with_provider_peers(mut self, peers: Vec<PeerInfo>) -> Self {
        self.provider_peers = peers;
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.clone().into_serde_message().to_bytes()?)
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> Result<Message> {
        Message::from_serde_message(internal::DHTMessage::from_bytes(bytes.as_ref())?)
    }

    fn into_serde_message(self) -> internal::DHTMessage {
        internal::DHTMessage {
            message_type: self.message_type.tag(),
            key: self.key,
            cluster_level: self.cluster_level,
            record: self.record,
            closer_peers: peers_to_serde(self.closer_peers),
            provider_peers: peers_to_serde(self.provider_peers),
        }
    }

    fn from_serde_message(msg: internal::DHTMessage) -> Result<Message> {
        Ok(Message {
            message_type: MessageType::try_from(msg.message_type)?,
            key: msg.key,
            cluster_level: msg.cluster_level,
            record: msg.record,
            closer_peers: peers_from_serde(msg.closer_peers),
            provider_peers: peers_from_serde(msg.provider_peers),
        })
    }
}

fn peers_to_serde(peers: Vec<PeerInfo>) -> Vec<internal::DHTPeer> {
    peers
        .into_iter()
        .map(|peer| internal::DHTPeer {
            id: peer.id.to_bytes(),
            addrs: peer
                .addrs
                .iter()
                .map(|addr| serde_bytes::ByteBuf::from(sockaddr_to_bytes(addr)))
                .collect(),
            connection: peer.connection.tag(),
        })
        .collect()
}

/// Addresses that don't decode are dropped, the peer is kept.
fn peers_from_serde(peers: Vec<internal::DHTPeer>) -> Vec<PeerInfo> {
    peers
        .into_iter()
        .map(|peer| PeerInfo {
            id: PeerId::new(peer.id),
            addrs: peer.addrs.iter().filter_map(bytes_to_sockaddr).collect(),
            connection: Connectedness::from_tag(peer.connection),
        })
        .collect()
}
