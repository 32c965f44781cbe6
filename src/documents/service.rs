//! Document service coordinating local storage, the store registry, and Gemini.

use crate::{
    config::{Config, get_config},
    documents::{
        DocumentKind, StoreRegistry,
        indexing::wait_until_indexed,
        prompt::build_prompt,
        types::{ChatAnswer, DocumentError, StoreRecord, UploadOutcome},
    },
    gemini::GeminiService,
    metrics::{MetricsSnapshot, UsageMetrics},
};
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Tunables for [`DocumentService`], usually derived from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// Directory receiving local copies of uploads.
    pub upload_dir: PathBuf,
    /// Model used to answer questions.
    pub model: String,
    /// Delay between indexing status polls.
    pub poll_interval: Duration,
    /// Ceiling on the indexing wait.
    pub indexing_timeout: Duration,
}

impl ServiceSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_dir: config.upload_dir.clone(),
            model: config.gemini_model.clone(),
            poll_interval: config.indexing_poll_interval(),
            indexing_timeout: config.indexing_timeout(),
        }
    }
}

/// Runs the upload → index → chat lifecycle against Gemini File Search.
///
/// The service owns the Gemini client, the in-memory registry, and usage counters. Construct it
/// once near process start and share it through an `Arc`.
pub struct DocumentService {
    gemini: GeminiService,
    registry: StoreRegistry,
    settings: ServiceSettings,
    metrics: Arc<UsageMetrics>,
}

/// Abstraction over the document pipeline used by the HTTP surface.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Save, register, and index an uploaded document.
    async fn upload_document(
        &self,
        filename: String,
        content: Bytes,
    ) -> Result<UploadOutcome, DocumentError>;

    /// Answer a question grounded on one registered document.
    async fn ask(&self, store_id: &str, question: &str) -> Result<ChatAnswer, DocumentError>;

    /// Enumerate live documents in upload order.
    async fn list_documents(&self) -> Vec<StoreRecord>;

    /// Forget a document and remove its local copy.
    async fn delete_document(&self, store_id: &str) -> Result<(), DocumentError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl DocumentService {
    /// Build a service from the global configuration.
    pub fn new() -> Result<Self, DocumentError> {
        let config = get_config();
        tracing::info!(model = %config.gemini_model, "Initializing Gemini client");
        let gemini = GeminiService::new()?;
        Self::from_parts(gemini, ServiceSettings::from_config(config))
    }

    /// Build a service from an explicit client and settings, creating the upload directory.
    pub fn from_parts(
        gemini: GeminiService,
        settings: ServiceSettings,
    ) -> Result<Self, DocumentError> {
        std::fs::create_dir_all(&settings.upload_dir)?;
        tracing::debug!(upload_dir = %settings.upload_dir.display(), "Upload directory ready");
        Ok(Self {
            gemini,
            registry: StoreRegistry::new(),
            settings,
            metrics: Arc::new(UsageMetrics::new()),
        })
    }

    /// Save a document locally, create a File Search store for it, and wait for indexing.
    ///
    /// Nothing is registered unless indexing completes. On failure the local copy is removed and
    /// the remote store, if one was created, is deleted on a best-effort basis.
    pub async fn upload_document(
        &self,
        filename: String,
        content: Bytes,
    ) -> Result<UploadOutcome, DocumentError> {
        if filename.trim().is_empty() {
            return Err(DocumentError::MissingFilename);
        }
        let kind = DocumentKind::from_filename(&filename).ok_or_else(|| {
            DocumentError::UnsupportedFileType {
                allowed: DocumentKind::allowed_extensions(),
            }
        })?;

        let store_id = Uuid::new_v4().to_string();
        let file_path = self
            .settings
            .upload_dir
            .join(format!("{store_id}{}", kind.extension()));
        let size_bytes = content.len() as u64;
        let content_sha256 = hex::encode(Sha256::digest(&content));

        tracing::info!(%store_id, %filename, size_bytes, "Receiving document");
        tokio::fs::create_dir_all(&self.settings.upload_dir).await?;
        tokio::fs::write(&file_path, &content).await?;

        let store = match self
            .gemini
            .create_store(&format!("Store for {filename}"))
            .await
        {
            Ok(store) => store,
            Err(error) => {
                discard_local_copy(&file_path).await;
                return Err(error.into());
            }
        };

        if let Err(error) = self.index_document(&store.name, &filename, kind, content).await {
            discard_local_copy(&file_path).await;
            self.discard_remote_store(&store.name).await;
            return Err(error);
        }

        self.registry
            .insert(StoreRecord {
                store_id: store_id.clone(),
                remote_store_name: store.name.clone(),
                filename: filename.clone(),
                file_path,
                kind,
                size_bytes,
                content_sha256,
                uploaded_at: OffsetDateTime::now_utc(),
            })
            .await;
        self.metrics.record_upload();
        tracing::info!(%store_id, store = %store.name, %filename, "Document indexed");

        Ok(UploadOutcome { store_id, filename })
    }

    async fn index_document(
        &self,
        store_name: &str,
        filename: &str,
        kind: DocumentKind,
        content: Bytes,
    ) -> Result<(), DocumentError> {
        let operation = self
            .gemini
            .upload_to_store(store_name, filename, kind.mime_type(), content)
            .await?;
        wait_until_indexed(
            &self.gemini,
            operation,
            self.settings.poll_interval,
            self.settings.indexing_timeout,
        )
        .await?;
        Ok(())
    }

    /// Ask the configured model a question, grounded on the document behind `store_id`.
    pub async fn ask(&self, store_id: &str, question: &str) -> Result<ChatAnswer, DocumentError> {
        let record = self
            .registry
            .get(store_id)
            .await
            .ok_or_else(|| DocumentError::StoreNotFound {
                store_id: store_id.to_string(),
            })?;
        if question.trim().is_empty() {
            return Err(DocumentError::EmptyQuestion);
        }

        let prompt = build_prompt(question);
        let response = self
            .gemini
            .generate_content(&self.settings.model, &prompt, &record.remote_store_name)
            .await?;
        let answer = response.text().ok_or(DocumentError::EmptyAnswer)?;

        self.metrics.record_answer();
        tracing::info!(
            store_id,
            model = %self.settings.model,
            answer_chars = answer.chars().count(),
            "Question answered"
        );
        Ok(ChatAnswer {
            answer,
            filename: record.filename,
        })
    }

    /// Live documents in upload order.
    pub async fn list_documents(&self) -> Vec<StoreRecord> {
        self.registry.list().await
    }

    /// Remove a document's local copy, forget it, and drop its remote store.
    ///
    /// A local copy that is already gone is not an error. Any other removal failure leaves the
    /// document registered so the delete can be retried. Remote deletion failures are logged
    /// and otherwise ignored.
    pub async fn delete_document(&self, store_id: &str) -> Result<(), DocumentError> {
        let not_found = || DocumentError::StoreNotFound {
            store_id: store_id.to_string(),
        };
        let record = self.registry.get(store_id).await.ok_or_else(not_found)?;

        match tokio::fs::remove_file(&record.file_path).await {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(store_id, path = %record.file_path.display(), "Local copy already gone");
            }
            Err(error) => {
                tracing::error!(store_id, path = %record.file_path.display(), error = %error, "Failed to remove local copy");
                return Err(DocumentError::RemoveLocalCopy {
                    path: record.file_path,
                    source: error,
                });
            }
        }

        // A concurrent delete may have won the race after the lookup.
        let record = self.registry.remove(store_id).await.ok_or_else(not_found)?;
        self.discard_remote_store(&record.remote_store_name).await;
        self.metrics.record_delete();
        tracing::info!(store_id, filename = %record.filename, "Document deleted");
        Ok(())
    }

    /// Return the current usage metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn discard_remote_store(&self, store_name: &str) {
        if let Err(error) = self.gemini.delete_store(store_name).await {
            tracing::warn!(store = store_name, error = %error, "Failed to delete remote store");
        }
    }
}

async fn discard_local_copy(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %error, "Failed to remove local copy");
    }
}

#[async_trait]
impl DocumentApi for DocumentService {
    async fn upload_document(
        &self,
        filename: String,
        content: Bytes,
    ) -> Result<UploadOutcome, DocumentError> {
        DocumentService::upload_document(self, filename, content).await
    }

    async fn ask(&self, store_id: &str, question: &str) -> Result<ChatAnswer, DocumentError> {
        DocumentService::ask(self, store_id, question).await
    }

    async fn list_documents(&self) -> Vec<StoreRecord> {
        DocumentService::list_documents(self).await
    }

    async fn delete_document(&self, store_id: &str) -> Result<(), DocumentError> {
        DocumentService::delete_document(self, store_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        DocumentService::metrics_snapshot(self)
    }
}
