//! HTTP transport for the Model Context Protocol
//!
//! Hosts the `/mcp` listener, liveness probes and the discovery document.

pub mod handlers;
