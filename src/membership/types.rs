use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::net::SocketAddr;

/// Position on the ring: lowercase hex SHA-1 digest (40 chars).
///
/// Every id has the same length, so the derived lexicographic `Ord` on the
/// inner string is also the numeric order of the digests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub String);

impl NodeId {
    /// Hashes an arbitrary string (a key or a node address) onto the ring.
    pub fn hash_of(input: &str) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(input.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The id a node takes from its own listening address.
    pub fn for_addr(addr: &SocketAddr) -> Self {
        Self::hash_of(&addr.to_string())
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ring member: identity plus the address its peer listener is bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub id: NodeId,
    pub addr: SocketAddr,
}

impl Member {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            id: NodeId::for_addr(&addr),
            addr,
        }
    }
}

/// Lifecycle of a node's ring view.
///
/// `Unjoined -> AwaitingAck` when the JOIN is sent to the bootstrap,
/// `AwaitingAck -> Joined` when the propagated ring snapshot arrives.
/// The bootstrap node starts in `Joined`. There is no way back out of `Joined`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JoinState {
    Unjoined,
    AwaitingAck,
    Joined,
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinState::Unjoined => "unjoined",
            JoinState::AwaitingAck => "awaiting_ack",
            JoinState::Joined => "joined",
        };
        f.write_str(name)
    }
}
