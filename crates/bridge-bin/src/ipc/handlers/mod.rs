//! Bridge handler implementations.
//!
//! Handlers are thin: decode params, run the bridge call on the blocking
//! pool, and map the outcome onto a response.

pub mod activity;
pub mod health;
pub mod storage;

use bridge_ipc::{error_codes, Request, Response};
use native_local_storage::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use tokio::task;

/// Map a storage error onto its protocol error code, keeping the message.
pub(crate) fn storage_error_response(id: &str, err: &StorageError) -> Response {
    let code = match err {
        StorageError::ReadFailure(_) => error_codes::READ_FAILURE,
        StorageError::WriteFailure(_) => error_codes::WRITE_FAILURE,
        StorageError::Platform(_) => error_codes::INTERNAL_ERROR,
    };
    Response::error(id, code, &err.to_string())
}

/// Decode the request params, or the `INVALID_PARAMS` response to send back.
pub(crate) fn params<T: DeserializeOwned>(req: &Request) -> Result<T, Response> {
    req.parse_params().map_err(|e| {
        Response::error(
            &req.id,
            error_codes::INVALID_PARAMS,
            &format!("Invalid params: {}", e),
        )
    })
}

/// Run a blocking bridge call off the async workers.
pub(crate) async fn run_blocking<T, F>(id: &str, f: F) -> Result<T, Response>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(storage_error_response(id, &e)),
        Err(e) => Err(Response::error(
            id,
            error_codes::INTERNAL_ERROR,
            &format!("Task join error: {}", e),
        )),
    }
}
