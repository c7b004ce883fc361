//! Model Context Protocol (MCP) Module
//!
//! JSON-RPC models and constants, RPC helpers, and the axum handlers for
//! initialize, tools/list and tools/call.

pub mod handlers;
pub mod helpers;
pub mod models;

pub use handlers::routes;
