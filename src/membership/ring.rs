//! Consistent-hash ownership over an ordered map of members.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

use super::types::{Member, NodeId};

/// Ordered mapping `NodeId -> address` forming the ring topology.
///
/// Built with the local member already inside, and `replace_all` refuses an
/// empty snapshot, so a `Ring` reachable through `MembershipService` is never
/// empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ring {
    nodes: BTreeMap<NodeId, SocketAddr>,
}

impl Ring {
    pub fn new(local: &Member) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(local.id.clone(), local.addr);
        Self { nodes }
    }

    pub fn from_members<I>(members: I) -> Self
    where
        I: IntoIterator<Item = Member>,
    {
        Self {
            nodes: members.into_iter().map(|m| (m.id, m.addr)).collect(),
        }
    }

    /// Successor lookup: the smallest id `>= id`, wrapping to the first
    /// member when `id` is past the last one.
    pub fn owner_of(&self, id: &NodeId) -> Option<(&NodeId, &SocketAddr)> {
        self.nodes
            .range(id.clone()..)
            .next()
            .or_else(|| self.nodes.iter().next())
    }

    /// Adds a member, overwriting the address if the id is already present.
    pub fn insert(&mut self, id: NodeId, addr: SocketAddr) -> Option<SocketAddr> {
        self.nodes.insert(id, addr)
    }

    /// Wholesale replacement. Returns `false` and keeps the current view
    /// when the snapshot is empty.
    pub fn replace_all(&mut self, snapshot: Ring) -> bool {
        if snapshot.is_empty() {
            return false;
        }
        self.nodes = snapshot.nodes;
        true
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn members(&self) -> Vec<Member> {
        self.nodes
            .iter()
            .map(|(id, addr)| Member {
                id: id.clone(),
                addr: *addr,
            })
            .collect()
    }

    pub fn addresses(&self) -> Vec<SocketAddr> {
        self.nodes.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
