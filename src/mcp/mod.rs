//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides JSON-RPC validation, negotiation, formatting and routing, plus the
//! line-delimited stdio transport.

pub mod rpc;
pub mod server;
pub mod stdio;
