//! Peer identities and their position in the Kademlia keyspace.
use std::fmt::{self, Debug, Display, Formatter};

use bytes::Bytes;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha1_smol::Sha1;

/// The size of keyspace positions in bytes.
pub const ID_SIZE: usize = 20;
pub const MAX_DISTANCE: u8 = ID_SIZE as u8 * 8;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Opaque identity of a peer.
///
/// The bytes are never interpreted by this crate beyond equality and hashing into
/// the keyspace.
pub struct PeerId(Bytes);

impl PeerId {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        PeerId(bytes.into())
    }

    /// A random id shaped like a sha2-256 multihash.
    pub fn random() -> PeerId {
        let mut rng = rand::thread_rng();
        let digest: [u8; 32] = rng.gen();

        let mut bytes = Vec::with_capacity(34);
        bytes.extend([0x12, 0x20]);
        bytes.extend(digest);

        PeerId(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    /// Position of this peer in the keyspace.
    pub fn keyspace(&self) -> Id {
        Id::hash(&self.0)
    }
}

impl From<&[u8]> for PeerId {
    fn from(bytes: &[u8]) -> Self {
        PeerId(Bytes::copy_from_slice(bytes))
    }
}

impl Debug for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", hex::encode(&self.0))
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

#[derive(Clone, Copy, PartialEq, Ord, PartialOrd, Eq, Hash)]
/// Kademlia keyspace position of a peer or a lookup target
pub struct Id(pub [u8; ID_SIZE]);

impl Id {
    /// Hash arbitrary bytes (a record key, a content id or a peer id) into the keyspace.
    pub fn hash(bytes: &[u8]) -> Id {
        let mut hasher = Sha1::new();
        hasher.update(bytes);

        Id(hasher.digest().bytes())
    }

    /// XOR metric between this Id and a target Id.
    ///
    /// Comparing two results orders peers by closeness to the same target.
    pub fn xor(&self, other: &Id) -> Id {
        let mut result = [0_u8; ID_SIZE];

        for (i, byte) in result.iter_mut().enumerate() {
            *byte = self.0[i] ^ other.0[i];
        }

        Id(result)
    }

    /// Simplified XOR distance between this Id and a target Id.
    ///
    /// The distance is the number of trailing non zero bits in the XOR result.
    ///
    /// Distance to self is 0
    /// Distance to the furthest Id is 160
    /// Distance to an Id with 5 leading matching bits is 155
    pub fn distance(&self, other: &Id) -> u8 {
        for i in 0..ID_SIZE {
            let a = self.0[i];
            let b = other.0[i];

            if a != b {
                // leading zeros so far + leading zeros of this byte
                let leading_zeros = (i as u32 * 8 + (a ^ b).leading_zeros()) as u8;

                return MAX_DISTANCE - leading_zeros;
            }
        }

        0
    }
}

impl Debug for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", hex::encode(self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn distance_to_self() {
        let id = PeerId::random().keyspace();
        let distance = id.distance(&id);
        assert_eq!(distance, 0)
    }

    #[test]
    fn distance_to_id() {
        let id = Id([
            6, 57, 161, 226, 79, 187, 138, 178, 119, 223, 3, 52, 118, 171, 13, 225, 15, 171, 59,
            220,
        ]);

        let target = Id([
            3, 91, 18, 19, 237, 14, 76, 98, 121, 161, 186, 95, 183, 235, 95, 226, 193, 226, 37,
            224,
        ]);

        let distance = id.distance(&target);

        assert_eq!(distance, 155)
    }

    #[test]
    fn xor_orders_by_closeness() {
        let target = Id([0; ID_SIZE]);
        let mut near = [0; ID_SIZE];
        near[ID_SIZE - 1] = 1;
        let mut far = [0; ID_SIZE];
        far[0] = 1;

        assert!(Id(near).xor(&target) < Id(far).xor(&target));
        assert_eq!(target.xor(&target), target);
    }

    #[test]
    fn random_peer_ids_are_multihash_shaped() {
        let id = PeerId::random();

        assert_eq!(id.as_bytes().len(), 34);
        assert_eq!(&id.as_bytes()[..2], &[0x12, 0x20]);
        assert_ne!(id, PeerId::random());
    }
}
