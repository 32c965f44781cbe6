//! Document chat pipeline: local storage, store registry, indexing wait, and grounded answers.

pub mod indexing;
mod kind;
pub mod prompt;
pub mod registry;
mod service;
pub mod types;

pub use kind::DocumentKind;
pub use registry::StoreRegistry;
pub use service::{DocumentApi, DocumentService, ServiceSettings};
pub use types::{ChatAnswer, DocumentError, StoreRecord, UploadOutcome};
