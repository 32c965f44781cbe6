#![deny(missing_docs)]

//! Core library for the docchat server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Upload, indexing, and chat orchestration.
pub mod documents;
/// Gemini File Search client.
pub mod gemini;
/// Structured logging and tracing setup.
pub mod logging;
/// Usage counters.
pub mod metrics;
