//! MCP (Model Context Protocol) module
//!
//! Serves the prompt tools to MCP clients over stdio.

pub mod server;
pub mod tools;
pub mod types;

pub use server::McpServer;
