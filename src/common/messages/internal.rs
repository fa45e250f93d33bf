use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use crate::common::Record;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTMessage {
    #[serde(rename = "type")]
    pub message_type: i32,

    pub key: Bytes,

    #[serde(default)]
    #[serde(rename = "clusterLevel")]
    pub cluster_level: i32,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,

    #[serde(default)]
    #[serde(rename = "closerPeers")]
    pub closer_peers: Vec<DHTPeer>,

    #[serde(default)]
    #[serde(rename = "providerPeers")]
    pub provider_peers: Vec<DHTPeer>,
}

impl DHTMessage {
    pub fn from_bytes(bytes: &[u8]) -> Result<DHTMessage, serde_bencode::Error> {
        let obj = serde_bencode::from_bytes(bytes)?;
        Ok(obj)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DHTPeer {
    pub id: Bytes,

    #[serde(default)]
    // Compact form, see [crate::common::sockaddr_to_bytes]
    pub addrs: Vec<ByteBuf>,

    #[serde(default)]
    pub connection: i32,
}
