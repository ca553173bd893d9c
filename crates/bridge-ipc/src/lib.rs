//! Transport for the host binding protocol.
//!
//! This crate provides:
//! - Unix domain socket server and client
//! - NDJSON request/response handling over any async byte stream (stdio)
//! - Handler registration keyed by [`Method`]

#[cfg(unix)]
mod client;
mod error;
mod server;

pub use bridge_protocol_types::{
    error_codes, ErrorInfo, KeyParams, Method, Request, Response, SetItemParams,
};
#[cfg(unix)]
pub use client::BridgeClient;
pub use error::{IpcError, IpcResult};
pub use server::{BridgeServer, HandlerFn};
