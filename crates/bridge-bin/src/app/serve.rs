//! Running the bridge server.

use super::AppResult;
use crate::ipc::register_handlers;
use bridge_config_and_utils::{Config, Paths};
use bridge_ipc::BridgeServer;
use native_local_storage::create_bridge;
use std::sync::Arc;
use tracing::info;

/// Open the configured store and serve the bridge protocol until shutdown.
///
/// With `stdio` the protocol runs on stdin/stdout and ends when stdin closes;
/// otherwise it listens on the Unix socket under the base directory.
pub async fn run_bridge(config: Config, paths: Paths, stdio: bool) -> AppResult<()> {
    let bridge = Arc::new(create_bridge(&config, &paths)?);
    info!(
        backend = %config.backend,
        suite = %bridge.suite_name(),
        stdio,
        "Bridge starting"
    );

    let server = BridgeServer::new();
    register_handlers(&server, bridge, config.backend).await;

    let shutdown_tx = server.shutdown_sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    if stdio {
        server
            .serve_stream(tokio::io::stdin(), tokio::io::stdout())
            .await?;
    } else {
        serve_socket(&server, &paths).await?;
    }

    info!("Bridge stopped");
    Ok(())
}

#[cfg(unix)]
async fn serve_socket(server: &BridgeServer, paths: &Paths) -> AppResult<()> {
    let socket_path = paths.socket_file();
    let client = bridge_ipc::BridgeClient::new(&socket_path);
    if client.is_server_running().await {
        return Err(format!("a bridge is already serving on {}", socket_path.display()).into());
    }

    let pid_path = paths.pid_file();
    std::fs::write(&pid_path, std::process::id().to_string())?;

    let result = server.run(&socket_path).await;
    let _ = std::fs::remove_file(&pid_path);
    result?;
    Ok(())
}

#[cfg(not(unix))]
async fn serve_socket(_server: &BridgeServer, _paths: &Paths) -> AppResult<()> {
    Err("socket serving needs Unix domain sockets; use --stdio".into())
}
