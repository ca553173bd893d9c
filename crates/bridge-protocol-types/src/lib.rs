//! Host binding protocol types.
//!
//! A JSON-RPC-like request/response protocol, one JSON object per line.
//! Method names match the host's generated module interface
//! (`getItem`, `setItem`, ...), so a host shim can forward calls verbatim.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Bridge methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "health")]
    Health,
    #[serde(rename = "shutdown")]
    Shutdown,

    // Storage
    #[serde(rename = "getItem")]
    GetItem,
    #[serde(rename = "setItem")]
    SetItem,
    #[serde(rename = "removeItem")]
    RemoveItem,
    #[serde(rename = "clear")]
    Clear,
    #[serde(rename = "incrementItem")]
    IncrementItem,

    // Live activities
    #[serde(rename = "createActivity")]
    CreateActivity,
    #[serde(rename = "updateActivity")]
    UpdateActivity,
    #[serde(rename = "deleteActivity")]
    DeleteActivity,
    #[serde(rename = "autoUpdateActivity")]
    AutoUpdateActivity,

    /// Any method name this version does not know.
    #[serde(other)]
    Unknown,
}

/// Params for methods addressing a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParams {
    pub key: String,
}

/// Params for `setItem`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetItemParams {
    pub key: String,
    pub value: String,
}

/// Bridge request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation.
    pub id: String,
    /// Method to invoke.
    pub method: Method,
    /// Method parameters (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Request {
    /// Create a new request with auto-generated ID.
    pub fn new(method: Method) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method,
            params: None,
        }
    }

    /// Create a new request with parameters.
    pub fn with_params(method: Method, params: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            method,
            params: Some(params),
        }
    }

    /// Decode `params` into a typed struct.
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, String> {
        let params = self
            .params
            .clone()
            .ok_or_else(|| "params are required".to_string())?;
        serde_json::from_value(params).map_err(|e| e.to_string())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Bridge response message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request ID for correlation.
    pub id: String,
    /// Result data (if successful).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error information (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// Error information in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    pub code: i32,
    /// Error message.
    pub message: String,
    /// Additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Response {
    /// Create a successful response.
    pub fn success(id: &str, result: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: &str, code: i32, message: &str) -> Self {
        Self {
            id: id.to_string(),
            result: None,
            error: Some(ErrorInfo {
                code,
                message: message.to_string(),
                data: None,
            }),
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Error codes. JSON-RPC reserved codes plus storage failures.
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const READ_FAILURE: i32 = -32010;
    pub const WRITE_FAILURE: i32 = -32011;
}
