//! Model Context Protocol (MCP) integration for ragindex.
//!
//! Exposes the retrieval pipeline to agent hosts over stdio:
//!
//! - Tools: `search` (top-k similarity search returning plain text) and `metrics`.
//! - Resources: `mcp://settings` (index and top-k limits) and `mcp://usage`.
//!
//! Indexing and purge stay on the command line; agents only read.

mod format;
pub mod handlers;
mod registry;
mod schemas;
mod server;

pub use server::RagIndexMcpServer;
