//! MXP operation catalog and its MCP integrations
//!
//! `operations` holds the catalog shared by the REST routes and the MCP tools.
//! The remaining modules expose that catalog as tools, static resources and prompts.

pub mod operations;
pub mod prompts;
pub mod resources;
pub mod tools;
pub mod utils;
