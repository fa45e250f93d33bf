//! Validated content identifiers for provider requests.
use std::fmt::{self, Display, Formatter};

use cid::Cid;

use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
/// A content id parsed from a request key.
///
/// Both CIDv0 (bare sha2-256 multihash) and CIDv1 are accepted. Bytes that don't
/// parse, or that carry anything after the content id, are rejected.
pub struct ContentId(Cid);

impl ContentId {
    pub fn from_key(key: &[u8]) -> Result<Self> {
        let cid = Cid::try_from(key).map_err(|error| Error::InvalidKey(error.to_string()))?;

        if cid.encoded_len() != key.len() {
            return Err(Error::InvalidKey(format!(
                "{} trailing bytes after content id",
                key.len().saturating_sub(cid.encoded_len())
            )));
        }

        Ok(ContentId(cid))
    }

    pub fn cid(&self) -> &Cid {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_bytes()
    }
}

impl From<Cid> for ContentId {
    fn from(cid: Cid) -> Self {
        ContentId(cid)
    }
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
