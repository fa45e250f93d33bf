//! Peer entries handed back to requesters.
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::common::PeerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// What the local node knows about its link to a peer.
pub enum Connectedness {
    /// No connection and no knowledge either way.
    #[default]
    Unknown,
    /// There is a live connection.
    Connected,
    /// Recently connected, or dialable addresses are known.
    Connectable,
    /// Recent attempts to connect failed.
    CannotConnect,
}

impl Connectedness {
    pub fn tag(&self) -> i32 {
        match self {
            Connectedness::Unknown => 0,
            Connectedness::Connected => 1,
            Connectedness::Connectable => 2,
            Connectedness::CannotConnect => 3,
        }
    }

    /// Unknown tags are read as [Connectedness::Unknown].
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            1 => Connectedness::Connected,
            2 => Connectedness::Connectable,
            3 => Connectedness::CannotConnect,
            _ => Connectedness::Unknown,
        }
    }

    /// Whether a requester could reach the peer through us right now.
    pub fn is_reachable(&self) -> bool {
        matches!(self, Connectedness::Connected | Connectedness::Connectable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A peer and the addresses it can be reached at.
pub struct PeerInfo {
    pub id: PeerId,
    pub addrs: Vec<SocketAddr>,
    pub connection: Connectedness,
}

impl PeerInfo {
    /// Creates a new PeerInfo from an id and its addresses.
    pub fn new(id: PeerId, addrs: Vec<SocketAddr>) -> PeerInfo {
        PeerInfo {
            id,
            addrs,
            connection: Connectedness::Unknown,
        }
    }

    /// A PeerInfo without addresses can't be routed to.
    pub fn is_routable(&self) -> bool {
        !self.addrs.is_empty()
    }
}

/// Compact address encoding: 4 or 16 bytes of IP followed by a big-endian port.
pub fn sockaddr_to_bytes(sockaddr: &SocketAddr) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(18);

    match sockaddr {
        SocketAddr::V4(v4) => bytes.extend(v4.ip().octets()),
        SocketAddr::V6(v6) => bytes.extend(v6.ip().octets()),
    }

    bytes.extend(sockaddr.port().to_be_bytes());

    bytes
}

/// Inverse of [sockaddr_to_bytes], `None` for any other length.
pub fn bytes_to_sockaddr<T: AsRef<[u8]>>(bytes: T) -> Option<SocketAddr> {
    let bytes = bytes.as_ref();

    let (ip, port) = match bytes.len() {
        6 => {
            let octets: [u8; 4] = bytes[..4].try_into().ok()?;
            (IpAddr::V4(Ipv4Addr::from(octets)), &bytes[4..])
        }
        18 => {
            let octets: [u8; 16] = bytes[..16].try_into().ok()?;
            (IpAddr::V6(Ipv6Addr::from(octets)), &bytes[16..])
        }
        _ => return None,
    };

    let port: [u8; 2] = port.try_into().ok()?;

    Some(SocketAddr::new(ip, u16::from_be_bytes(port)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_addresses() {
        let v4: SocketAddr = "99.100.101.102:1030".parse().unwrap();
        let v6: SocketAddr = "[2001:db8::1]:4001".parse().unwrap();

        assert_eq!(sockaddr_to_bytes(&v4), vec![99, 100, 101, 102, 4, 6]);
        assert_eq!(bytes_to_sockaddr(sockaddr_to_bytes(&v6)), Some(v6));
        assert_eq!(bytes_to_sockaddr([1, 2, 3]), None);
    }

    #[test]
    fn connectedness_tags() {
        assert_eq!(Connectedness::from_tag(Connectedness::Connectable.tag()), Connectedness::Connectable);
        assert_eq!(Connectedness::from_tag(42), Connectedness::Unknown);
        assert!(Connectedness::Connected.is_reachable());
        assert!(!Connectedness::CannotConnect.is_reachable());
    }

    #[test]
    fn routable() {
        let id = PeerId::random();

        assert!(!PeerInfo::new(id.clone(), vec![]).is_routable());
        assert!(PeerInfo::new(id, vec!["127.0.0.1:4001".parse().unwrap()]).is_routable());
    }
}
