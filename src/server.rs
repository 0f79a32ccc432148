use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, error};
use crate::config::ServerConfig;
use crate::session::Session;
use crate::storage::local::LocalStorage;
use crate::router::Router;
use crate::metrics::MetricsCollector;
use std::sync::Arc;

pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("binding {}", config.listen_address))?;
    info!("Server listening on {}", listener.local_addr()?);

    serve(listener, config).await
}

/// Accept connections forever, one task per connection.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let storage = Arc::new(LocalStorage::new(config.downloads_directory.clone()));
    let metrics = Arc::new(MetricsCollector::new());
    let router = Arc::new(Router::with_defaults());
    let config = Arc::new(config);

    info!("Serving templates from {:?}", config.templates_directory);
    router.list_routes();

    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!("New connection from {}", peer);
                metrics.connection_opened();

                let storage_clone = Arc::clone(&storage);
                let router_clone = Arc::clone(&router);
                let metrics_clone = Arc::clone(&metrics);
                let config_clone = Arc::clone(&config);
                let metrics_for_cleanup = Arc::clone(&metrics);

                tokio::spawn(async move {
                    let session = Session::new(
                        socket,
                        storage_clone,
                        router_clone,
                        metrics_clone,
                        config_clone,
                    );
                    if let Err(e) = session.run().await {
                        error!("Session error for {}: {}", peer, e);
                    } else {
                        info!("Session completed for {}", peer);
                    }
                    metrics_for_cleanup.connection_closed();
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
