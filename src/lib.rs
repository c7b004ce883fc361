//! Simulated commerce backend for tool-calling agents.
//!
//! An in-memory entity store with a generic query engine, typed commerce
//! rules on top (carts, loyalty, pricing), and a name-routed dispatcher
//! exposed over the Model Context Protocol.

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod mcp;
pub mod store;

// Infrastructure
pub mod router;
