//! Handler registration for the bridge server.

use crate::ipc::handlers;
use bridge_config_and_utils::BackendKind;
use bridge_ipc::BridgeServer;
use native_local_storage::LocalStorageBridge;
use std::sync::Arc;
use tracing::info;

/// Register all bridge handlers.
pub async fn register_handlers(
    server: &BridgeServer,
    bridge: Arc<LocalStorageBridge>,
    backend: BackendKind,
) {
    handlers::health::register(server, bridge.suite_name(), backend).await;
    handlers::storage::register(server, bridge.clone()).await;
    handlers::activity::register(server, bridge).await;

    info!("All bridge handlers registered");
}
