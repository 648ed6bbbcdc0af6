//! Node configuration, read from the command line or the environment.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::client::ClientSettings;

/// Port distance between a node's peer listener and its HTTP API.
pub const HTTP_PORT_OFFSET: u16 = 1000;

#[derive(Debug, Clone, Parser)]
#[command(name = "simple-dht", about = "Consistent-hashing key-value ring node")]
pub struct NodeConfig {
    /// Address of the peer listener; its string form is hashed into the node id.
    #[arg(long, env = "DHT_BIND")]
    pub bind: SocketAddr,

    /// Fixed join address shared by every node. Omit (or pass --bind) to start as the bootstrap.
    #[arg(long, env = "DHT_BOOTSTRAP")]
    pub bootstrap: Option<SocketAddr>,

    /// HTTP API address. Defaults to the bind port + 1000.
    #[arg(long, env = "DHT_HTTP")]
    pub http: Option<SocketAddr>,

    #[arg(long, env = "DHT_CONNECT_TIMEOUT_MS", default_value_t = 2000)]
    pub connect_timeout_ms: u64,

    /// Bound on one request/reply exchange. Unset means wait for the reply.
    #[arg(long, env = "DHT_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    #[arg(long, env = "DHT_CONNECT_ATTEMPTS", default_value_t = 3)]
    pub connect_attempts: usize,

    #[arg(long, env = "DHT_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

impl NodeConfig {
    /// Config for an embedded node, with defaults for everything but addresses.
    pub fn local(bind: SocketAddr, bootstrap: Option<SocketAddr>) -> Self {
        Self {
            bind,
            bootstrap,
            http: None,
            connect_timeout_ms: 2000,
            request_timeout_ms: None,
            connect_attempts: 3,
            log_level: tracing::Level::INFO,
        }
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http.unwrap_or_else(|| {
            SocketAddr::new(
                self.bind.ip(),
                self.bind.port().saturating_add(HTTP_PORT_OFFSET),
            )
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            connect_attempts: self.connect_attempts,
            request_timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }
}
