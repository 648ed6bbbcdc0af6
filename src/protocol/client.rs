use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

use super::codec::{read_frame, write_frame};
use super::types::{Envelope, Request, Response};

/// Knobs for outbound peer calls.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Upper bound for a single TCP connect attempt.
    pub connect_timeout: Duration,
    /// Number of connect attempts before the call fails.
    pub connect_attempts: usize,
    /// Bound on the write-then-read exchange. `None` waits for the reply indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            connect_attempts: 3,
            request_timeout: None,
        }
    }
}

/// Opens one connection per call, sends one envelope, waits for one reply.
///
/// Only the connect step is retried: once a request has been written it is
/// never resent, so a non-idempotent scan like DELETE_ALL is applied at most once.
#[derive(Debug, Clone)]
pub struct PeerClient {
    local_addr: SocketAddr,
    settings: ClientSettings,
}

impl PeerClient {
    pub fn new(local_addr: SocketAddr, settings: ClientSettings) -> Self {
        Self {
            local_addr,
            settings,
        }
    }

    pub async fn call(&self, target: SocketAddr, request: Request) -> Result<Response> {
        let intent = request.intent();
        let envelope = Envelope {
            sender: self.local_addr,
            receiver: target,
            request,
        };

        let mut stream = self.connect_with_retry(target).await?;
        tracing::debug!("{} -> {}: {}", self.local_addr, target, intent);

        let exchange = async {
            write_frame(&mut stream, &envelope).await?;
            read_frame::<_, Response>(&mut stream).await
        };

        let response = match self.settings.request_timeout {
            Some(limit) => tokio::time::timeout(limit, exchange).await.map_err(|_| {
                anyhow::anyhow!("{} to {} timed out after {:?}", intent, target, limit)
            })??,
            None => exchange.await?,
        };

        Ok(response)
    }

    async fn connect_with_retry(&self, target: SocketAddr) -> Result<TcpStream> {
        let attempts = self.settings.connect_attempts.max(1);
        let mut delay_ms = 100u64;

        for attempt in 0..attempts {
            let result =
                tokio::time::timeout(self.settings.connect_timeout, TcpStream::connect(target))
                    .await;

            let error = match result {
                Ok(Ok(stream)) => return Ok(stream),
                Ok(Err(e)) => anyhow::anyhow!("Failed to connect to {}: {}", target, e),
                Err(_) => anyhow::anyhow!(
                    "Connecting to {} timed out after {:?}",
                    target,
                    self.settings.connect_timeout
                ),
            };

            if attempt + 1 == attempts {
                return Err(error);
            }

            let jitter = rand::random::<u64>() % 50;
            tracing::debug!(
                "Connect attempt {}/{} to {} failed, retrying",
                attempt + 1,
                attempts,
                target
            );
            tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
            delay_ms = (delay_ms * 2).min(1000);
        }

        Err(anyhow::anyhow!("Connect attempts to {} exhausted", target))
    }
}
