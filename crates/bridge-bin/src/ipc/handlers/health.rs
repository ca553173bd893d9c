//! Health and shutdown handlers.

use bridge_config_and_utils::BackendKind;
use bridge_ipc::{BridgeServer, Method, Response};
use tracing::info;

/// Register health and shutdown handlers.
pub async fn register(server: &BridgeServer, suite: &str, backend: BackendKind) {
    let suite = suite.to_string();
    server
        .register_handler(Method::Health, move |req| {
            let suite = suite.clone();
            async move {
                Response::success(
                    &req.id,
                    serde_json::json!({
                        "status": "ok",
                        "version": env!("CARGO_PKG_VERSION"),
                        "backend": backend.as_str(),
                        "suite": suite,
                    }),
                )
            }
        })
        .await;

    let shutdown_tx = server.shutdown_sender();
    server
        .register_handler(Method::Shutdown, move |req| {
            let tx = shutdown_tx.clone();
            async move {
                info!("Shutdown requested");
                let _ = tx.send(());
                Response::success(&req.id, serde_json::json!({ "status": "shutting_down" }))
            }
        })
        .await;

    info!("Registered health handlers");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_ipc::Request;

    #[tokio::test]
    async fn test_health_reports_backend_and_suite() {
        let server = BridgeServer::new();
        register(&server, "local-storage", BackendKind::Sqlite).await;

        let response = server.dispatch(Request::new(Method::Health)).await;
        let result = response.result.unwrap();
        assert_eq!(result["status"], "ok");
        assert_eq!(result["backend"], "sqlite");
        assert_eq!(result["suite"], "local-storage");
    }

    #[tokio::test]
    async fn test_shutdown_signals_server() {
        let server = BridgeServer::new();
        register(&server, "local-storage", BackendKind::Memory).await;
        let mut shutdown_rx = server.shutdown_sender().subscribe();

        let response = server.dispatch(Request::new(Method::Shutdown)).await;
        assert_eq!(response.result.unwrap()["status"], "shutting_down");
        assert!(shutdown_rx.recv().await.is_ok());
    }
}
