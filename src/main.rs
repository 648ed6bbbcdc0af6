use clap::Parser;
use simple_dht::api::handlers::routes;
use simple_dht::config::NodeConfig;
use simple_dht::node::Node;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    tracing::info!("Starting node on {}", config.bind);
    match config.bootstrap {
        Some(bootstrap) if bootstrap != config.bind => {
            tracing::info!("Bootstrap node: {}", bootstrap);
        }
        _ => tracing::info!("Starting as bootstrap node"),
    }

    // 1. Peer listener, ring view and join:
    let node = Node::start(&config).await?;
    tracing::info!("Node ID: {}", node.membership().local.id);

    // 2. Ring reporter:
    let membership = node.membership().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));

        loop {
            interval.tick().await;
            let members = membership.members().await;
            tracing::info!(
                "Ring view ({}): {} members",
                membership.join_state().await,
                members.len()
            );
            for member in members {
                tracing::debug!("  - {} at {}", member.id.short(), member.addr);
            }
        }
    });

    // 3. HTTP API:
    let app = routes(node.router.clone());
    let http_addr = config.http_addr();

    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
