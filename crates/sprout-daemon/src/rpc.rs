//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! JSON-RPC method calls to the appropriate command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sprout_engine::EngineError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Domain errors

    /// Mission not found, not owned, or not in a usable state (-32030).
    pub fn not_found() -> Self {
        Self {
            code: -32030,
            message: "NOT_FOUND".to_string(),
            data: None,
        }
    }

    /// Action not valid for the current state (-32031).
    pub fn invalid_state() -> Self {
        Self {
            code: -32031,
            message: "INVALID_STATE".to_string(),
            data: None,
        }
    }

    /// Duplicate same-day check-in (-32032).
    pub fn already_done() -> Self {
        Self {
            code: -32032,
            message: "ALREADY_DONE".to_string(),
            data: None,
        }
    }

    /// No progression profile for the user (-32033).
    pub fn profile_not_found(user_id: i64) -> Self {
        Self {
            code: -32033,
            message: "PROFILE_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"user_id": user_id})),
        }
    }

    /// Insufficient balance (-32040).
    pub fn insufficient_balance(required: i64, available: i64) -> Self {
        Self {
            code: -32040,
            message: "INSUFFICIENT_BALANCE".to_string(),
            data: Some(serde_json::json!({"required": required, "available": available})),
        }
    }
}

impl From<EngineError> for RpcError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound => RpcError::not_found(),
            EngineError::InvalidState => RpcError::invalid_state(),
            EngineError::AlreadyDone => RpcError::already_done(),
            EngineError::InsufficientFunds {
                required,
                available,
            } => RpcError::insufficient_balance(required, available),
            EngineError::ProfileNotFound(user_id) => RpcError::profile_not_found(user_id),
            EngineError::Db(e) => RpcError::internal_error(&format!("db error: {e}")),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    let result = match method {
        // Profile commands
        "create_user" => commands::profile::create_user(&state, &request.params).await,
        "get_profile" => commands::profile::get_profile(&state, &request.params).await,
        "get_preferences" => commands::profile::get_preferences(&state, &request.params).await,
        "get_mission_history" => {
            commands::profile::get_mission_history(&state, &request.params).await
        }

        // Mission commands
        "get_today_missions" => {
            commands::missions::get_today_missions(&state, &request.params).await
        }
        "get_weekly_missions" => {
            commands::missions::get_weekly_missions(&state, &request.params).await
        }
        "accept_mission" => commands::missions::accept_mission(&state, &request.params).await,
        "check_in" => commands::missions::check_in(&state, &request.params).await,
        "complete_mission" => commands::missions::complete_mission(&state, &request.params).await,
        "skip_mission" => commands::missions::skip_mission(&state, &request.params).await,
        "refresh_daily_pool" => {
            commands::missions::refresh_daily_pool(&state, &request.params).await
        }

        // Gamification commands
        "get_badges" => commands::gamification::get_badges(&state, &request.params).await,
        "equip_badge" => commands::gamification::equip_badge(&state, &request.params).await,
        "record_questionnaire" => {
            commands::gamification::record_questionnaire(&state, &request.params).await
        }

        // System commands
        "subscribe_events" => commands::system::subscribe_events(&state, &request.params).await,
        "poll_events" => commands::system::poll_events(&state, &request.params).await,
        "unsubscribe_events" => {
            commands::system::unsubscribe_events(&state, &request.params).await
        }
        "get_status" => commands::system::get_status(&state, &request.params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::not_found();
        assert_eq!(err.code, -32030);
        assert_eq!(err.message, "NOT_FOUND");

        let err = RpcError::insufficient_balance(20, 5);
        assert_eq!(err.code, -32040);

        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: RpcError = EngineError::AlreadyDone.into();
        assert_eq!(err.message, "ALREADY_DONE");

        let err: RpcError = EngineError::InsufficientFunds {
            required: 20,
            available: 3,
        }
        .into();
        assert_eq!(err.code, -32040);
        assert_eq!(
            err.data,
            Some(serde_json::json!({"required": 20, "available": 3}))
        );

        let err: RpcError = EngineError::ProfileNotFound(9).into();
        assert_eq!(err.code, -32033);
    }

    #[test]
    fn test_rpc_response_success() {
        let resp = RpcResponse::success(
            serde_json::json!(1),
            serde_json::json!({"coins": 25}),
        );
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }
}
