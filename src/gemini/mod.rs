//! Gemini File Search integration.

pub mod client;
pub mod types;

pub use client::GeminiService;
pub use types::{FileSearchStore, GeminiError, GenerateContentResponse, Operation, OperationStatus};
