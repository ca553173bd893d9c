//! Bridge server implementation.
//!
//! Each connection carries NDJSON: one request per line in, one response per
//! line out, in order. The same loop serves Unix socket connections and any
//! other byte stream (stdin/stdout for a host that spawns the bridge).

use crate::{error_codes, IpcResult, Method, Request, Response};
use std::collections::HashMap;
use std::future::Future;
#[cfg(unix)]
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
#[cfg(unix)]
use tracing::error;

/// Handler function type for bridge methods.
pub type HandlerFn =
    Box<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

type Handlers = Arc<RwLock<HashMap<Method, HandlerFn>>>;

/// Bridge server dispatching requests to registered handlers.
pub struct BridgeServer {
    handlers: Handlers,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for BridgeServer {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeServer {
    /// Create a new server with no handlers.
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
        }
    }

    /// Register a handler for a method, replacing any previous one.
    pub async fn register_handler<F, Fut>(&self, method: Method, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let boxed_handler: HandlerFn = Box::new(move |req| Box::pin(handler(req)));
        self.handlers.write().await.insert(method, boxed_handler);
    }

    /// Get a shutdown sender (for handlers that need to trigger shutdown).
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Trigger shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Dispatch a single request to its handler.
    pub async fn dispatch(&self, request: Request) -> Response {
        dispatch(&self.handlers, request).await
    }

    /// Listen on a Unix domain socket until shutdown.
    ///
    /// A stale socket file at `socket_path` is replaced; the file is removed
    /// again on shutdown.
    #[cfg(unix)]
    pub async fn run(&self, socket_path: &Path) -> IpcResult<()> {
        use tokio::net::UnixListener;

        if socket_path.exists() {
            std::fs::remove_file(socket_path)?;
        }
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(socket_path)?;
        info!(path = %socket_path.display(), "Bridge server listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _)) => {
                            let handlers = self.handlers.clone();
                            let shutdown_rx = self.shutdown_tx.subscribe();
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                if let Err(e) = handle_connection(reader, writer, handlers, shutdown_rx).await {
                                    error!(error = %e, "Connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Accept error");
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Bridge server shutting down");
                    break;
                }
            }
        }

        let _ = std::fs::remove_file(socket_path);
        Ok(())
    }

    /// Serve a single byte stream until EOF or shutdown.
    pub async fn serve_stream<R, W>(&self, reader: R, writer: W) -> IpcResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let shutdown_rx = self.shutdown_tx.subscribe();
        handle_connection(reader, writer, self.handlers.clone(), shutdown_rx).await
    }
}

async fn dispatch(handlers: &Handlers, request: Request) -> Response {
    let handlers = handlers.read().await;
    match handlers.get(&request.method) {
        Some(handler) => handler(request).await,
        None => Response::error(
            &request.id,
            error_codes::METHOD_NOT_FOUND,
            &format!("Method not found: {:?}", request.method),
        ),
    }
}

async fn write_response<W>(writer: &mut W, response: &Response) -> IpcResult<()>
where
    W: AsyncWrite + Unpin,
{
    let response_json = response.to_json()?;
    debug!(response = %response_json, "Sending response");
    writer.write_all(response_json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Decode one request line. Invalid JSON is a parse error; JSON that is not a
/// request is an invalid request, answered with its `id` when it has one.
fn parse_request(line: &str) -> Result<Request, Response> {
    let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
        Response::error("", error_codes::PARSE_ERROR, &format!("Parse error: {}", e))
    })?;
    let id = value
        .get("id")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    serde_json::from_value(value).map_err(|e| {
        Response::error(
            &id,
            error_codes::INVALID_REQUEST,
            &format!("Invalid request: {}", e),
        )
    })
}

/// Handle a single client connection.
async fn handle_connection<R, W>(
    reader: R,
    mut writer: W,
    handlers: Handlers,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> IpcResult<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    debug!("Client connected");

    loop {
        line.clear();
        let bytes_read = tokio::select! {
            result = reader.read_line(&mut line) => result?,
            _ = shutdown_rx.recv() => {
                debug!("Connection closing for shutdown");
                break;
            }
        };

        if bytes_read == 0 {
            debug!("Client disconnected");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!(request = %trimmed, "Received request");

        let request = match parse_request(trimmed) {
            Ok(req) => req,
            Err(response) => {
                warn!(id = %response.id, "Rejected malformed request");
                write_response(&mut writer, &response).await?;
                continue;
            }
        };

        let response = dispatch(&handlers, request).await;
        write_response(&mut writer, &response).await?;
    }

    Ok(())
}
