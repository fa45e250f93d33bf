//! Records stored and served by the DHT.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// A key value record, as sent in PUT_VALUE requests and GET_VALUE responses.
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
    /// RFC3339 time at which this node received the record.
    ///
    /// Only ever set locally; whatever a remote peer puts here is discarded.
    #[serde(
        default,
        rename = "timeReceived",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_received: Option<String>,
}

impl Record {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            time_received: None,
        }
    }

    /// Drop any receipt time declared by the sender.
    pub fn clean(&mut self) {
        self.time_received = None;
    }

    /// Record the local receipt time.
    pub fn stamp_received(&mut self, now: DateTime<Utc>) {
        self.time_received = Some(now.to_rfc3339_opts(SecondsFormat::Nanos, true));
    }

    /// Parsed receipt time, `None` if missing or not valid RFC3339.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        let time = self.time_received.as_deref()?;

        DateTime::parse_from_rfc3339(time)
            .ok()
            .map(|time| time.with_timezone(&Utc))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_bencode::Error> {
        serde_bencode::from_bytes(bytes)
    }
}

/// Key under which a record (or content) for `key` lives in the datastore.
pub fn storage_key(key: &[u8]) -> String {
    format!("/{}", hex::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_bytes() {
        let mut record = Record::new(&b"/v/hello"[..], &b"world"[..]);
        record.stamp_received(Utc::now());

        let parsed = Record::from_bytes(&record.to_bytes().unwrap()).unwrap();

        assert_eq!(parsed, record);
        assert!(parsed.received_at().is_some());
    }

    #[test]
    fn missing_receipt_time_is_omitted() {
        let record = Record::new(&b"k"[..], &b"v"[..]);
        let bytes = record.to_bytes().unwrap();

        assert!(!bytes
            .windows(b"timeReceived".len())
            .any(|w| w == b"timeReceived"));
        assert_eq!(Record::from_bytes(&bytes).unwrap().time_received, None);
    }

    #[test]
    fn clean_strips_remote_time() {
        let mut record = Record::new(&b"k"[..], &b"v"[..]);
        record.time_received = Some("2999-01-01T00:00:00Z".to_string());

        record.clean();

        assert_eq!(record.time_received, None);
    }

    #[test]
    fn unparseable_receipt_time() {
        let mut record = Record::new(&b"k"[..], &b"v"[..]);
        record.time_received = Some("yesterday".to_string());

        assert_eq!(record.received_at(), None);
    }

    #[test]
    fn storage_key_is_hex() {
        assert_eq!(storage_key(b"/k1"), "/2f6b31");
    }
}
