use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use crate::membership::ring::Ring;
use crate::membership::types::NodeId;

/// Payload-free tag of a request, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Join,
    JoinHandled,
    Insert,
    Query,
    Delete,
    QueryAll,
    DeleteAll,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Join => "JOIN",
            Intent::JoinHandled => "JOIN_HANDLED",
            Intent::Insert => "INSERT",
            Intent::Query => "QUERY",
            Intent::Delete => "DELETE",
            Intent::QueryAll => "QUERY_ALL",
            Intent::DeleteAll => "DELETE_ALL",
        };
        f.write_str(name)
    }
}

/// A peer request. Each variant carries only the fields its handler reads.
///
/// - `Join`: a new node announcing itself to the bootstrap.
/// - `JoinHandled`: the bootstrap's full ring, pushed to every other member.
/// - `Insert/Query/Delete`: single-key operations against the receiver's local store.
/// - `QueryAll/DeleteAll`: the per-member leg of a cluster-wide scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Request {
    Join { id: NodeId, addr: SocketAddr },
    JoinHandled { ring: Ring },
    Insert { key: String, value: String },
    Query { key: String },
    Delete { key: String },
    QueryAll,
    DeleteAll,
}

impl Request {
    pub fn intent(&self) -> Intent {
        match self {
            Request::Join { .. } => Intent::Join,
            Request::JoinHandled { .. } => Intent::JoinHandled,
            Request::Insert { .. } => Intent::Insert,
            Request::Query { .. } => Intent::Query,
            Request::Delete { .. } => Intent::Delete,
            Request::QueryAll => Intent::QueryAll,
            Request::DeleteAll => Intent::DeleteAll,
        }
    }
}

/// The single reply written back on a connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Response {
    /// Empty acknowledgement (JOIN, JOIN_HANDLED, INSERT).
    Ack,
    /// Entries read from a local store (QUERY, QUERY_ALL).
    Entries(BTreeMap<String, String>),
    /// Number of entries removed (DELETE, DELETE_ALL).
    Count(u64),
}

impl Response {
    pub fn into_entries(self) -> anyhow::Result<BTreeMap<String, String>> {
        match self {
            Response::Entries(entries) => Ok(entries),
            other => Err(anyhow::anyhow!("Expected entries, got {:?}", other)),
        }
    }

    pub fn into_count(self) -> anyhow::Result<u64> {
        match self {
            Response::Count(count) => Ok(count),
            other => Err(anyhow::anyhow!("Expected count, got {:?}", other)),
        }
    }
}

/// What actually travels over the wire for a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub sender: SocketAddr,
    pub receiver: SocketAddr,
    pub request: Request,
}
