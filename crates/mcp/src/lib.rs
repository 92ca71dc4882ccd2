//! JSON-RPC tool server for Glia Functions
//!
//! Speaks newline-delimited JSON-RPC 2.0 on stdio and exposes every
//! management operation as a named tool with a JSON schema. Tool failures are
//! reported inside the result with `isError` so clients can show them to the
//! model; protocol problems become JSON-RPC errors.

/// Request dispatch and transport
pub mod server;
/// Glia operations as tools
pub mod tools;
/// Protocol types
pub mod types;

#[cfg(test)]
pub mod test_helpers;

pub use server::{McpServer, ToolHandler, serve_stdio};
pub use tools::{GliaTools, ToolContext, catalog};
pub use types::{McpError, ToolError};
