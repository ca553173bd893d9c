//! Talking to a running bridge (stop, status, activity commands).

use super::AppResult;
use bridge_config_and_utils::Paths;
use bridge_ipc::Method;

/// Forward an activity command to the running bridge and print the snapshot.
#[cfg(unix)]
pub async fn forward_activity(paths: &Paths, method: Method, key: &str) -> AppResult<()> {
    use bridge_ipc::{BridgeClient, KeyParams, Request};

    let client = BridgeClient::new(&paths.socket_file());
    if !client.is_server_running().await {
        return Err("no bridge is running; start one with `native-local-storage serve`".into());
    }

    let params = serde_json::to_value(KeyParams {
        key: key.to_string(),
    })?;
    let response = client.call(&Request::with_params(method, params)).await?;

    match (response.result, response.error) {
        (_, Some(error)) => Err(format!("bridge error {}: {}", error.code, error.message).into()),
        (Some(serde_json::Value::Null), None) | (None, None) => {
            println!("No live activity");
            Ok(())
        }
        (Some(activity), None) => {
            println!("{}", serde_json::to_string_pretty(&activity)?);
            Ok(())
        }
    }
}

/// Stop the bridge.
#[cfg(unix)]
pub async fn stop_bridge(paths: &Paths) -> AppResult<()> {
    use bridge_ipc::{BridgeClient, Request};

    let socket_path = paths.socket_file();
    let pid_path = paths.pid_file();

    if !socket_path.exists() {
        println!("Bridge is not running (socket not found)");
        if pid_path.exists() {
            let _ = std::fs::remove_file(&pid_path);
        }
        return Ok(());
    }

    let client = BridgeClient::new(&socket_path);
    match client.call(&Request::new(Method::Shutdown)).await {
        Ok(response) if response.is_success() => println!("Bridge shutdown initiated"),
        Ok(response) => println!("Shutdown failed: {:?}", response.error),
        Err(e) => println!("Failed to connect to bridge: {}", e),
    }

    // Wait for the server to remove its socket (up to 3 seconds)
    for _ in 0..30 {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        if !socket_path.exists() {
            println!("Bridge stopped");
            return Ok(());
        }
    }

    if !client.is_server_running().await {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
        println!("Cleaned up stale socket file");
    } else {
        println!("Bridge did not stop within 3 seconds");
    }

    Ok(())
}

/// Check bridge status.
#[cfg(unix)]
pub async fn check_status(paths: &Paths) -> AppResult<()> {
    use bridge_ipc::{BridgeClient, Request};

    let socket_path = paths.socket_file();
    if !socket_path.exists() {
        println!("Bridge is not running (socket not found)");
        return Ok(());
    }

    let client = BridgeClient::new(&socket_path);
    match client.call(&Request::new(Method::Health)).await {
        Ok(response) => match (response.result, response.error) {
            (_, Some(error)) => println!("Bridge returned error: {}", error.message),
            (Some(result), None) => {
                let field = |name: &str| {
                    result
                        .get(name)
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown")
                        .to_string()
                };
                let pid = std::fs::read_to_string(paths.pid_file()).ok();

                println!("Bridge is running");
                println!("  Status:  {}", field("status"));
                println!("  Version: {}", field("version"));
                println!("  Backend: {}", field("backend"));
                println!("  Suite:   {}", field("suite"));
                if let Some(pid) = pid {
                    println!("  PID:     {}", pid.trim());
                }
                println!("  Socket:  {}", socket_path.display());
            }
            (None, None) => println!("Bridge is running (no details available)"),
        },
        Err(e) => {
            println!("Failed to connect to bridge: {}", e);
            println!("Bridge may not be running or socket may be stale");
        }
    }

    Ok(())
}

#[cfg(not(unix))]
pub async fn forward_activity(_paths: &Paths, _method: Method, _key: &str) -> AppResult<()> {
    Err("activity commands need Unix domain sockets".into())
}

#[cfg(not(unix))]
pub async fn stop_bridge(_paths: &Paths) -> AppResult<()> {
    Err("stop needs Unix domain sockets".into())
}

#[cfg(not(unix))]
pub async fn check_status(_paths: &Paths) -> AppResult<()> {
    Err("status needs Unix domain sockets".into())
}
