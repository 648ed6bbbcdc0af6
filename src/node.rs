//! A running ring member: peer listener, ring view, local store and router.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::NodeConfig;
use crate::membership::service::MembershipService;
use crate::protocol::client::PeerClient;
use crate::router::service::Router;
use crate::server::listener::Server;
use crate::storage::memory::{LocalStore, MemoryStore};

pub struct Node {
    pub router: Arc<Router>,
    server_handle: JoinHandle<()>,
}

impl Node {
    /// Starts a node backed by an in-memory store.
    pub async fn start(config: &NodeConfig) -> Result<Self> {
        Self::start_with_store(config, Arc::new(MemoryStore::new())).await
    }

    /// Binds the peer listener, starts serving, then joins via the bootstrap.
    ///
    /// The node id is derived from the bound address, so binding port 0 works.
    /// A failed JOIN is logged and the node keeps running as a ring of one.
    pub async fn start_with_store(
        config: &NodeConfig,
        store: Arc<dyn LocalStore>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        let local_addr = listener.local_addr()?;
        let bootstrap = config.bootstrap.unwrap_or(local_addr);

        let membership = MembershipService::new(local_addr, bootstrap);
        let client = PeerClient::new(local_addr, config.client_settings());
        let router = Router::new(membership, store, client);

        let server = Server::new(listener, router.clone());
        let server_handle = tokio::spawn(server.serve());

        if let Err(e) = router.join().await {
            tracing::warn!("{:#}", e);
        }

        Ok(Self {
            router,
            server_handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.router.local_addr()
    }

    pub fn membership(&self) -> &Arc<MembershipService> {
        self.router.membership()
    }

    /// Stops accepting peer connections.
    pub fn shutdown(&self) {
        self.server_handle.abort();
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}
