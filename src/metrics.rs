use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing document activity.
#[derive(Default)]
pub struct UsageMetrics {
    documents_uploaded: AtomicU64,
    questions_answered: AtomicU64,
    documents_deleted: AtomicU64,
}

impl UsageMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that finished indexing.
    pub fn record_upload(&self) {
        self.documents_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_answer(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a deleted document.
    pub fn record_delete(&self) {
        self.documents_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            documents_deleted: self.documents_deleted.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of usage counters used for reporting.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents uploaded and indexed since startup.
    pub documents_uploaded: u64,
    /// Number of questions answered since startup.
    pub questions_answered: u64,
    /// Number of documents deleted since startup.
    pub documents_deleted: u64,
}
