//! Key-value handlers: `getItem`, `setItem`, `removeItem`, `clear`,
//! `incrementItem`.

use super::{params, run_blocking};
use bridge_ipc::{BridgeServer, KeyParams, Method, Response, SetItemParams};
use native_local_storage::{LocalStorageBridge, NativeLocalStorage};
use std::sync::Arc;

/// Register storage handlers.
pub async fn register(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    register_get_item(server, bridge.clone()).await;
    register_set_item(server, bridge.clone()).await;
    register_remove_item(server, bridge.clone()).await;
    register_increment_item(server, bridge.clone()).await;
    register_clear(server, bridge).await;
}

fn ok(id: &str) -> Response {
    Response::success(id, serde_json::json!({ "ok": true }))
}

async fn register_get_item(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    server
        .register_handler(Method::GetItem, move |req| {
            let bridge = bridge.clone();
            async move {
                let KeyParams { key } = match params(&req) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                match run_blocking(&req.id, move || bridge.get_item(&key)).await {
                    Ok(value) => Response::success(&req.id, serde_json::json!({ "value": value })),
                    Err(response) => response,
                }
            }
        })
        .await;
}

async fn register_set_item(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    server
        .register_handler(Method::SetItem, move |req| {
            let bridge = bridge.clone();
            async move {
                let SetItemParams { key, value } = match params(&req) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                match run_blocking(&req.id, move || bridge.set_item(&key, &value)).await {
                    Ok(()) => ok(&req.id),
                    Err(response) => response,
                }
            }
        })
        .await;
}

async fn register_remove_item(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    server
        .register_handler(Method::RemoveItem, move |req| {
            let bridge = bridge.clone();
            async move {
                let KeyParams { key } = match params(&req) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                match run_blocking(&req.id, move || bridge.remove_item(&key)).await {
                    Ok(()) => ok(&req.id),
                    Err(response) => response,
                }
            }
        })
        .await;
}

async fn register_increment_item(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    server
        .register_handler(Method::IncrementItem, move |req| {
            let bridge = bridge.clone();
            async move {
                let KeyParams { key } = match params(&req) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                match run_blocking(&req.id, move || bridge.increment_item(&key)).await {
                    Ok(value) => Response::success(&req.id, serde_json::json!({ "value": value })),
                    Err(response) => response,
                }
            }
        })
        .await;
}

async fn register_clear(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    server
        .register_handler(Method::Clear, move |req| {
            let bridge = bridge.clone();
            async move {
                match run_blocking(&req.id, move || bridge.clear()).await {
                    Ok(()) => ok(&req.id),
                    Err(response) => response,
                }
            }
        })
        .await;
}
