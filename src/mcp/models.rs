//! MCP Protocol Models and Constants
//!
//! Data structures and constants tied to the Model Context Protocol
//! (MCP) specification.

use serde::Deserialize;
use serde_json::Value;

/// Server identifier
pub const SERVER_NAME: &str = "commerce-mock-rust";
/// Protocol version for MCP
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Standard JSON-RPC 2.0 Request envelope
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version (should be "2.0")
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,

    /// Method name to invoke
    pub method: String,

    /// Parameters for the method
    pub params: Option<Value>,

    /// Request identifier
    pub id: Option<Value>,
}
