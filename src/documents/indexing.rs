//! Wait for a document import operation to finish.

use crate::documents::DocumentError;
use crate::gemini::{GeminiService, Operation};
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Poll `operation` until the provider reports it done, or fail once `timeout` has elapsed.
///
/// The ceiling bounds the whole wait, including a status request that is still in flight. The
/// status is polled every `poll_interval` with no backoff. A finished operation carrying an
/// error is reported as [`DocumentError::IndexingFailed`].
pub async fn wait_until_indexed(
    gemini: &GeminiService,
    operation: Operation,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Operation, DocumentError> {
    let started = Instant::now();
    let name = operation.name.clone();

    let polling = poll_until_done(gemini, operation, poll_interval);
    let operation = match tokio::time::timeout(timeout, polling).await {
        Ok(result) => result?,
        Err(_) => {
            let waited = started.elapsed();
            tracing::warn!(
                operation = %name,
                waited_ms = waited.as_millis() as u64,
                "Indexing wait exceeded ceiling"
            );
            return Err(DocumentError::IndexingTimeout { waited });
        }
    };

    if let Some(status) = &operation.error {
        tracing::error!(
            operation = %operation.name,
            code = status.code,
            message = %status.message,
            "Indexing operation failed"
        );
        return Err(DocumentError::IndexingFailed(status.message.clone()));
    }

    Ok(operation)
}

async fn poll_until_done(
    gemini: &GeminiService,
    mut operation: Operation,
    poll_interval: Duration,
) -> Result<Operation, DocumentError> {
    let mut polls = 0u32;
    while !operation.done {
        sleep(poll_interval).await;
        let mut polled = gemini.get_operation(&operation.name).await?;
        // Some responses omit the name; keep polling the original resource.
        if polled.name.is_empty() {
            polled.name = std::mem::take(&mut operation.name);
        }
        operation = polled;
        polls += 1;
        tracing::debug!(operation = %operation.name, done = operation.done, polls, "Polled indexing status");
    }
    Ok(operation)
}
