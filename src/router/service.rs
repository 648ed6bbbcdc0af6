use anyhow::Result;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::selector::KeySelector;
use crate::membership::ring::Ring;
use crate::membership::service::MembershipService;
use crate::membership::types::{Member, NodeId};
use crate::protocol::client::PeerClient;
use crate::protocol::types::{Envelope, Request, Response};
use crate::storage::memory::LocalStore;

/// Decides, per request, whether this node serves it or which peer does.
///
/// Used from two directions: local callers go through `insert`/`query`/`delete`,
/// and the peer server hands every inbound envelope to `handle`.
pub struct Router {
    membership: Arc<MembershipService>,
    store: Arc<dyn LocalStore>,
    client: PeerClient,
    /// Held for a whole propagation round so snapshots go out in JOIN order.
    propagation: Mutex<()>,
}

impl Router {
    pub fn new(
        membership: Arc<MembershipService>,
        store: Arc<dyn LocalStore>,
        client: PeerClient,
    ) -> Arc<Self> {
        Arc::new(Self {
            membership,
            store,
            client,
            propagation: Mutex::new(()),
        })
    }

    pub fn membership(&self) -> &Arc<MembershipService> {
        &self.membership
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.membership.local.addr
    }

    // ============================================================
    // CALLER-FACING OPERATIONS
    // ============================================================

    /// Stores `key` on its owner.
    ///
    /// A forwarded insert waits for the owner's ack; a failed forward is
    /// logged and returned to the caller.
    pub async fn insert(&self, key: String, value: String) -> Result<()> {
        let owner = self.membership.owner_of_key(&key).await;

        if self.membership.is_local(&owner) {
            tracing::debug!("INSERT {} stored locally", key);
            self.store.put(key, value);
            return Ok(());
        }

        tracing::debug!("INSERT {} forwarded to {}", key, owner);
        match self
            .client
            .call(
                owner,
                Request::Insert {
                    key: key.clone(),
                    value,
                },
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("Forwarding INSERT {} to {} failed: {}", key, owner, e);
                Err(e)
            }
        }
    }

    pub async fn query(&self, selector: &KeySelector) -> BTreeMap<String, String> {
        match selector {
            KeySelector::Local => self.local_entries(),
            KeySelector::All => self.query_all().await,
            KeySelector::Key(key) => self.query_key(key).await,
        }
    }

    pub async fn delete(&self, selector: &KeySelector) -> u64 {
        match selector {
            KeySelector::Local => self.store.delete_all(),
            KeySelector::All => self.delete_all().await,
            KeySelector::Key(key) => self.delete_key(key).await,
        }
    }

    async fn query_key(&self, key: &str) -> BTreeMap<String, String> {
        let owner = self.membership.owner_of_key(key).await;

        if self.membership.is_local(&owner) {
            return self.local_entry(key);
        }

        let request = Request::Query {
            key: key.to_string(),
        };
        match self
            .client
            .call(owner, request)
            .await
            .and_then(Response::into_entries)
        {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("QUERY {} on {} failed: {}", key, owner, e);
                BTreeMap::new()
            }
        }
    }

    async fn delete_key(&self, key: &str) -> u64 {
        let owner = self.membership.owner_of_key(key).await;

        if self.membership.is_local(&owner) {
            return self.store.delete(key) as u64;
        }

        let request = Request::Delete {
            key: key.to_string(),
        };
        match self
            .client
            .call(owner, request)
            .await
            .and_then(Response::into_count)
        {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("DELETE {} on {} failed: {}", key, owner, e);
                0
            }
        }
    }

    // ============================================================
    // SCATTER-GATHER
    // ============================================================

    /// Fans `request` out to every ring member at once and waits for all of
    /// them. The local member is served from the store without a round trip.
    /// Members that fail are logged and left out of the result.
    async fn scatter(&self, request: Request) -> Vec<(Member, Response)> {
        let members = self.membership.members().await;
        tracing::debug!("{} across {} members", request.intent(), members.len());

        let calls = members.into_iter().map(|member| {
            let request = request.clone();
            async move {
                let result = if self.membership.is_local(&member.addr) {
                    Ok(self.serve_locally(request))
                } else {
                    self.client.call(member.addr, request).await
                };
                (member, result)
            }
        });

        join_all(calls)
            .await
            .into_iter()
            .filter_map(|(member, result)| match result {
                Ok(response) => Some((member, response)),
                Err(e) => {
                    tracing::warn!(
                        "Dropping contribution of {} ({}): {}",
                        member.addr,
                        member.id.short(),
                        e
                    );
                    None
                }
            })
            .collect()
    }

    async fn query_all(&self) -> BTreeMap<String, String> {
        let mut combined = BTreeMap::new();

        for (member, response) in self.scatter(Request::QueryAll).await {
            match response.into_entries() {
                Ok(entries) => combined.extend(entries),
                Err(e) => tracing::warn!("Bad QUERY_ALL reply from {}: {}", member.addr, e),
            }
        }

        combined
    }

    async fn delete_all(&self) -> u64 {
        let mut removed = 0;

        for (member, response) in self.scatter(Request::DeleteAll).await {
            match response.into_count() {
                Ok(count) => removed += count,
                Err(e) => tracing::warn!("Bad DELETE_ALL reply from {}: {}", member.addr, e),
            }
        }

        removed
    }

    // ============================================================
    // JOIN PROTOCOL
    // ============================================================

    /// Announces this node to the bootstrap. No-op on the bootstrap itself.
    ///
    /// Success only means the bootstrap admitted us; the node reaches
    /// `Joined` once the bootstrap's ring snapshot arrives.
    pub async fn join(&self) -> Result<()> {
        if self.membership.is_bootstrap() {
            tracing::info!("Running as bootstrap node, nothing to join");
            return Ok(());
        }

        let bootstrap = self.membership.bootstrap();
        let local = self.membership.local.clone();
        tracing::info!("Joining ring via bootstrap {}", bootstrap);

        self.membership.mark_awaiting_ack().await;
        let request = Request::Join {
            id: local.id,
            addr: local.addr,
        };

        match self.client.call(bootstrap, request).await {
            Ok(_) => {
                tracing::info!("Bootstrap {} accepted JOIN", bootstrap);
                Ok(())
            }
            Err(e) => {
                self.membership.mark_unjoined().await;
                Err(e.context(format!("JOIN via {} failed", bootstrap)))
            }
        }
    }

    /// Sends the current ring to every member except this node.
    ///
    /// Rounds never overlap: the snapshot is taken after the previous round's
    /// sends have all been acknowledged, so a member never receives an older
    /// ring after a newer one.
    pub async fn propagate_ring(&self) {
        let _round = self.propagation.lock().await;
        let ring = self.membership.snapshot().await;
        let targets: Vec<SocketAddr> = ring
            .addresses()
            .into_iter()
            .filter(|addr| !self.membership.is_local(addr))
            .collect();

        tracing::info!(
            "Propagating ring of {} members to {} peers",
            ring.len(),
            targets.len()
        );

        let sends = targets.into_iter().map(|target| {
            let request = Request::JoinHandled { ring: ring.clone() };
            async move {
                if let Err(e) = self.client.call(target, request).await {
                    tracing::warn!("Failed to deliver ring snapshot to {}: {}", target, e);
                }
            }
        });

        join_all(sends).await;
    }

    // ============================================================
    // INBOUND DISPATCH
    // ============================================================

    /// Serves one inbound peer request.
    pub async fn handle(self: &Arc<Self>, envelope: Envelope) -> Response {
        tracing::debug!(
            "{} from {} (to {})",
            envelope.request.intent(),
            envelope.sender,
            envelope.receiver
        );

        match envelope.request {
            Request::Join { id, addr } => {
                self.handle_join(id, addr).await;
                Response::Ack
            }
            Request::JoinHandled { ring } => {
                self.handle_join_handled(ring).await;
                Response::Ack
            }
            other => self.serve_locally(other),
        }
    }

    async fn handle_join(self: &Arc<Self>, id: NodeId, addr: SocketAddr) {
        if NodeId::for_addr(&addr) != id {
            tracing::warn!(
                "JOIN from {} carries id {} not derived from its address",
                addr,
                id.short()
            );
        }

        self.membership.add_member(id, addr).await;

        // Propagation runs detached so the JOIN reply is not held up by it.
        let router = self.clone();
        tokio::spawn(async move {
            router.propagate_ring().await;
        });
    }

    async fn handle_join_handled(&self, ring: Ring) {
        self.membership.accept_snapshot(ring).await;
    }

    /// Store-level half of the dispatch table. Never forwards.
    fn serve_locally(&self, request: Request) -> Response {
        match request {
            Request::Insert { key, value } => {
                self.store.put(key, value);
                Response::Ack
            }
            Request::Query { key } => Response::Entries(self.local_entry(&key)),
            Request::Delete { key } => Response::Count(self.store.delete(&key) as u64),
            Request::QueryAll => Response::Entries(self.local_entries()),
            Request::DeleteAll => Response::Count(self.store.delete_all()),
            Request::Join { .. } | Request::JoinHandled { .. } => {
                tracing::warn!("Membership request reached the store dispatcher");
                Response::Ack
            }
        }
    }

    fn local_entry(&self, key: &str) -> BTreeMap<String, String> {
        self.store
            .get(key)
            .map(|value| BTreeMap::from([(key.to_string(), value)]))
            .unwrap_or_default()
    }

    fn local_entries(&self) -> BTreeMap<String, String> {
        self.store.scan_all().into_iter().collect()
    }
}
