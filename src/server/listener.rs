use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::protocol::codec::{read_frame, write_frame};
use crate::protocol::types::Envelope;
use crate::router::service::Router;

/// Pause after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Peer-facing listener: one task per accepted connection.
pub struct Server {
    listener: TcpListener,
    router: Arc<Router>,
}

impl Server {
    pub fn new(listener: TcpListener, router: Arc<Router>) -> Self {
        Self { listener, router }
    }

    /// Accept loop. Only returns if the task is dropped or aborted.
    pub async fn serve(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!("Peer server listening on {}", addr),
            Err(e) => warn!("Peer server listening on unknown address: {}", e),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let router = self.router.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, router).await {
                            warn!("Error handling peer connection from {}: {}", peer, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Reads one envelope, dispatches it, writes one reply, closes.
async fn handle_connection(mut stream: TcpStream, router: Arc<Router>) -> Result<()> {
    let envelope: Envelope = read_frame(&mut stream).await?;
    let response = router.handle(envelope).await;

    write_frame(&mut stream, &response).await?;
    stream.shutdown().await?;
    Ok(())
}
