//! Records, outcomes, and errors for the document chat pipeline.

use crate::documents::DocumentKind;
use crate::gemini::GeminiError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

/// Errors emitted by the document pipeline.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Upload carried a file type outside the allow-list.
    #[error("File type not supported. Allowed types: {allowed}")]
    UnsupportedFileType {
        /// Human readable list of accepted extensions.
        allowed: String,
    },
    /// Upload did not say what the file is called.
    #[error("Uploaded file has no filename")]
    MissingFilename,
    /// Question was empty or whitespace.
    #[error("Question must not be empty")]
    EmptyQuestion,
    /// No live store is registered under the identifier.
    #[error("Document not found. Please upload a document first.")]
    StoreNotFound {
        /// Identifier that was looked up.
        store_id: String,
    },
    /// Local copy of the upload could not be written.
    #[error("Failed to store uploaded file: {0}")]
    Storage(#[from] std::io::Error),
    /// Local copy of a deleted document could not be removed; the document stays registered.
    #[error("Failed to remove local copy {}: {source}", .path.display())]
    RemoveLocalCopy {
        /// Path of the copy that is still on disk.
        path: std::path::PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
    /// Gemini request failed.
    #[error("Gemini request failed: {0}")]
    Provider(#[from] GeminiError),
    /// Remote indexing did not finish before the ceiling.
    #[error("File upload timeout: indexing did not finish within {}s", .waited.as_secs())]
    IndexingTimeout {
        /// Time spent waiting before giving up.
        waited: Duration,
    },
    /// Remote indexing finished with an error.
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),
    /// The model produced no text for the question.
    #[error("The model returned an empty answer")]
    EmptyAnswer,
}

/// Metadata kept for each document registered with a remote store.
#[derive(Debug, Clone)]
pub struct StoreRecord {
    /// Identifier handed out to clients.
    pub store_id: String,
    /// Provider resource name of the File Search store.
    pub remote_store_name: String,
    /// Filename as supplied by the client.
    pub filename: String,
    /// Location of the local copy.
    pub file_path: PathBuf,
    /// Document type derived from the extension.
    pub kind: DocumentKind,
    /// Size of the uploaded content.
    pub size_bytes: u64,
    /// Lowercase hex SHA-256 of the uploaded content.
    pub content_sha256: String,
    /// Time the document finished indexing.
    pub uploaded_at: OffsetDateTime,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Identifier to use for subsequent chat requests.
    pub store_id: String,
    /// Filename as supplied by the client.
    pub filename: String,
}

/// Answer produced for a question.
#[derive(Debug, Clone)]
pub struct ChatAnswer {
    /// Model output, returned verbatim.
    pub answer: String,
    /// Filename of the document the answer is grounded on.
    pub filename: String,
}
