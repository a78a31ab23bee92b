#![deny(missing_docs)]

//! Core library for the ragindex document retrieval pipeline.

/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
mod http;
/// Structured logging and tracing setup.
pub mod logging;
/// Model Context Protocol server exposing the retrieval tool.
pub mod mcp;
/// Pipeline counters.
pub mod metrics;
/// Document processing pipeline utilities.
pub mod processing;
/// Vector index integration.
pub mod vectors;
