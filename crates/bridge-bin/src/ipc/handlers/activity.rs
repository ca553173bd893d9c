//! Live activity handlers.

use super::{params, run_blocking};
use bridge_ipc::{error_codes, BridgeServer, KeyParams, Method, Response};
use native_local_storage::{LiveActivity, LocalStorageBridge, StorageResult};
use std::sync::Arc;

type ActivityOp = fn(&LocalStorageBridge, &str) -> StorageResult<Option<LiveActivity>>;

/// Register activity handlers.
pub async fn register(server: &BridgeServer, bridge: Arc<LocalStorageBridge>) {
    register_activity_op(server, bridge.clone(), Method::CreateActivity, |b, key| {
        b.create_activity(key).map(Some)
    })
    .await;
    register_activity_op(server, bridge.clone(), Method::UpdateActivity, |b, key| {
        b.update_activity(key)
    })
    .await;
    register_activity_op(server, bridge.clone(), Method::DeleteActivity, |b, key| {
        b.delete_activity(key)
    })
    .await;
    register_activity_op(server, bridge, Method::AutoUpdateActivity, |b, key| {
        b.auto_update_activity(key).map(Some)
    })
    .await;
}

/// Each activity method reads a count from `key` and answers with the
/// resulting snapshot, or `null` when no activity is tracked.
async fn register_activity_op(
    server: &BridgeServer,
    bridge: Arc<LocalStorageBridge>,
    method: Method,
    op: ActivityOp,
) {
    server
        .register_handler(method, move |req| {
            let bridge = bridge.clone();
            async move {
                let KeyParams { key } = match params(&req) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                let activity = match run_blocking(&req.id, move || op(&bridge, &key)).await {
                    Ok(activity) => activity,
                    Err(response) => return response,
                };
                match serde_json::to_value(activity) {
                    Ok(value) => Response::success(&req.id, value),
                    Err(e) => Response::error(
                        &req.id,
                        error_codes::INTERNAL_ERROR,
                        &format!("Failed to encode activity: {}", e),
                    ),
                }
            }
        })
        .await;
}
