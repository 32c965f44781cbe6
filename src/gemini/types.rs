//! Wire types and errors shared by the Gemini client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned while interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Gemini API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Gemini responded with an unexpected status code.
    #[error("Unexpected Gemini response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Gemini.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The resumable upload handshake did not hand back a session URL.
    #[error("Upload session URL missing from Gemini response")]
    MissingUploadUrl,
    /// Response body could not be decoded into the expected shape.
    #[error("Malformed Gemini response: {0}")]
    InvalidResponse(String),
}

/// Remote File Search store as described by Gemini.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSearchStore {
    /// Resource name, e.g. `fileSearchStores/abc123`.
    pub name: String,
    /// Human readable label supplied at creation time.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Long-running operation tracking document import into a store.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Operation {
    /// Resource name used to poll the operation.
    #[serde(default)]
    pub name: String,
    /// Whether the provider finished processing.
    #[serde(default)]
    pub done: bool,
    /// Failure status reported once `done` is set.
    #[serde(default)]
    pub error: Option<OperationStatus>,
}

/// Error payload attached to a failed operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationStatus {
    /// Canonical error code.
    #[serde(default)]
    pub code: i32,
    /// Provider supplied description.
    #[serde(default)]
    pub message: String,
}

/// Subset of the `generateContent` response consumed by the chat path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    /// Candidate completions; only the first one is read.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One candidate completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Candidate {
    /// Generated content, absent when the candidate was blocked.
    #[serde(default)]
    pub content: Option<Content>,
}

/// Multi-part content body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Content {
    /// Ordered parts making up the content.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Single content part. Only text parts are of interest here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Part {
    /// Text payload, if this is a text part.
    #[serde(default)]
    pub text: Option<String>,
    /// Set on reasoning parts that must not be shown to the user.
    #[serde(default)]
    pub thought: Option<bool>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate, skipping thought parts.
    ///
    /// Returns `None` when the response carries no text at all.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let mut text = String::new();
        let mut seen = false;
        for part in &content.parts {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(fragment) = &part.text {
                text.push_str(fragment);
                seen = true;
            }
        }
        seen.then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "## Answer\n" },
                    { "text": "Forty two." }
                ] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .expect("decode");

        assert_eq!(response.text().as_deref(), Some("## Answer\nForty two."));
    }

    #[test]
    fn text_is_none_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .expect("decode");
        assert!(response.text().is_none());
    }

    #[test]
    fn operation_defaults_to_pending() {
        let operation: Operation =
            serde_json::from_value(json!({ "name": "fileSearchStores/s/operations/o" }))
                .expect("decode");
        assert!(!operation.done);
        assert!(operation.error.is_none());
    }
}
