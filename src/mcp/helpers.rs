//! JSON-RPC envelope helpers.

use serde_json::{json, Value};

use crate::dispatch::ToolDef;

/// Builds a JSON-RPC 2.0 success response, echoing the request id.
pub fn rpc_success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds a JSON-RPC 2.0 error response (e.g. -32601 for method not
/// found). Reserved for protocol-level failures; operation failures
/// travel inside the result envelope instead.
pub fn rpc_error(id: Value, code: i32, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

/// Input schema advertised for a tool: an open object that names the
/// required argument keys. Finer validation happens server-side.
pub fn input_schema(tool: &ToolDef) -> Value {
    json!({
        "type": "object",
        "required": tool.required,
        "additionalProperties": true,
    })
}
