use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::ring::Ring;
use super::types::{JoinState, Member, NodeId};

/// Owner of this node's ring view.
///
/// The ring lives behind a single `RwLock` for the whole process: JOIN and
/// JOIN_HANDLED handlers are the only writers, the router reads it on every
/// call. The guard is never held across a network round trip.
pub struct MembershipService {
    pub local: Member,
    bootstrap: SocketAddr,
    ring: RwLock<Ring>,
    state: RwLock<JoinState>,
}

impl MembershipService {
    pub fn new(local_addr: SocketAddr, bootstrap: SocketAddr) -> Arc<Self> {
        let local = Member::new(local_addr);
        let state = if local_addr == bootstrap {
            JoinState::Joined
        } else {
            JoinState::Unjoined
        };

        info!(
            "Local node {} at {} (bootstrap: {})",
            local.id.short(),
            local.addr,
            bootstrap
        );

        Arc::new(Self {
            ring: RwLock::new(Ring::new(&local)),
            local,
            bootstrap,
            state: RwLock::new(state),
        })
    }

    pub fn bootstrap(&self) -> SocketAddr {
        self.bootstrap
    }

    pub fn is_bootstrap(&self) -> bool {
        self.local.addr == self.bootstrap
    }

    pub fn is_local(&self, addr: &SocketAddr) -> bool {
        &self.local.addr == addr
    }

    /// Address of the member owning `id`.
    pub async fn owner_of(&self, id: &NodeId) -> SocketAddr {
        let ring = self.ring.read().await;
        ring.owner_of(id)
            .map(|(_, addr)| *addr)
            .unwrap_or(self.local.addr)
    }

    /// Hashes `key` and returns the address of its owner.
    pub async fn owner_of_key(&self, key: &str) -> SocketAddr {
        self.owner_of(&NodeId::hash_of(key)).await
    }

    pub async fn members(&self) -> Vec<Member> {
        self.ring.read().await.members()
    }

    pub async fn snapshot(&self) -> Ring {
        self.ring.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.ring.read().await.len()
    }

    pub async fn join_state(&self) -> JoinState {
        *self.state.read().await
    }

    /// JOIN receipt: admit `addr` under `id`.
    pub async fn add_member(&self, id: NodeId, addr: SocketAddr) {
        let mut ring = self.ring.write().await;
        if let Some(previous) = ring.insert(id.clone(), addr)
            && previous != addr
        {
            tracing::warn!(
                "Member {} moved from {} to {}",
                id.short(),
                previous,
                addr
            );
        }
        info!(
            "Member {} at {} joined, ring size now {}",
            id.short(),
            addr,
            ring.len()
        );
    }

    /// JOIN_HANDLED receipt: adopt the bootstrap's view.
    ///
    /// Members are never removed, so anything already known but absent from
    /// the snapshot is carried over. A snapshot that arrives late cannot
    /// shrink the ring.
    pub async fn accept_snapshot(&self, snapshot: Ring) {
        if snapshot.is_empty() {
            tracing::warn!("Ignoring empty ring snapshot");
            return;
        }

        {
            let mut ring = self.ring.write().await;
            let mut merged = snapshot;
            let mut kept = 0;

            if !merged.contains(&self.local.id) {
                tracing::warn!(
                    "Ring snapshot is missing local node {}, re-adding it",
                    self.local.id.short()
                );
            }
            for member in ring.members() {
                if !merged.contains(&member.id) {
                    merged.insert(member.id, member.addr);
                    kept += 1;
                }
            }

            if kept > 0 {
                tracing::debug!("Kept {} members missing from a stale snapshot", kept);
            }
            ring.replace_all(merged);
            info!("Adopted ring snapshot with {} members", ring.len());
        }

        *self.state.write().await = JoinState::Joined;
    }

    pub async fn mark_awaiting_ack(&self) {
        let mut state = self.state.write().await;
        if *state == JoinState::Unjoined {
            *state = JoinState::AwaitingAck;
        }
    }

    pub async fn mark_unjoined(&self) {
        let mut state = self.state.write().await;
        if *state == JoinState::AwaitingAck {
            *state = JoinState::Unjoined;
        }
    }
}
