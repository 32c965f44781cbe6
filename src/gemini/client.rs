//! HTTP client wrapper for the Gemini File Search and generation endpoints.

use crate::config::get_config;
use crate::gemini::types::{FileSearchStore, GeminiError, GenerateContentResponse, Operation};
use bytes::Bytes;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Per-request deadline used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const API_VERSION: &str = "v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Lightweight HTTP client for the Gemini API.
pub struct GeminiService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
}

impl GeminiService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, GeminiError> {
        let config = get_config();
        Self::with_request_timeout(
            &config.gemini_api_base_url,
            &config.google_api_key,
            config.gemini_request_timeout(),
        )
    }

    /// Construct a client against an explicit base URL and API key.
    pub fn with_endpoint(base_url: &str, api_key: impl Into<String>) -> Result<Self, GeminiError> {
        Self::with_request_timeout(base_url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Construct a client whose requests fail once `request_timeout` elapses.
    pub fn with_request_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, GeminiError> {
        let client = Client::builder()
            .user_agent("docchat/0.1")
            .timeout(request_timeout)
            .build()?;
        let base_url = normalize_base_url(base_url).map_err(GeminiError::InvalidUrl)?;
        let api_key = api_key.into();
        tracing::debug!(
            url = %base_url,
            has_api_key = !api_key.is_empty(),
            timeout_secs = request_timeout.as_secs(),
            "Initialized Gemini HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Create an empty File Search store.
    pub async fn create_store(&self, display_name: &str) -> Result<FileSearchStore, GeminiError> {
        let response = self
            .request(Method::POST, &format!("{API_VERSION}/fileSearchStores"))
            .json(&json!({ "displayName": display_name }))
            .send()
            .await?;

        let store: FileSearchStore = decode(response, "create store").await?;
        tracing::debug!(store = %store.name, display_name, "File search store created");
        Ok(store)
    }

    /// Upload a document into a store using the resumable upload protocol.
    ///
    /// Returns the long-running operation that tracks the import.
    pub async fn upload_to_store(
        &self,
        store_name: &str,
        display_name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> Result<Operation, GeminiError> {
        let start = self
            .request(
                Method::POST,
                &format!("upload/{API_VERSION}/{store_name}:uploadToFileSearchStore"),
            )
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", content.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "displayName": display_name, "mimeType": mime_type }))
            .send()
            .await?;

        let start = ensure_success(start, "start upload").await?;
        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .ok_or(GeminiError::MissingUploadUrl)?;

        let size = content.len();
        let response = self
            .client
            .post(&upload_url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("X-Goog-Upload-Offset", 0)
            .body(content)
            .send()
            .await?;

        let operation: Operation = decode(response, "upload content").await?;
        tracing::debug!(
            store = store_name,
            operation = %operation.name,
            bytes = size,
            "Document handed to file search store"
        );
        Ok(operation)
    }

    /// Fetch the current state of a long-running operation.
    pub async fn get_operation(&self, operation_name: &str) -> Result<Operation, GeminiError> {
        let response = self
            .request(Method::GET, &format!("{API_VERSION}/{operation_name}"))
            .send()
            .await?;
        decode(response, "get operation").await
    }

    /// Ask `model` to answer `prompt`, grounding it on a single File Search store.
    pub async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
        store_name: &str,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ],
            "tools": [
                {
                    "fileSearch": {
                        "fileSearchStoreNames": [store_name]
                    }
                }
            ]
        });

        let response = self
            .request(
                Method::POST,
                &format!("{API_VERSION}/models/{model}:generateContent"),
            )
            .json(&body)
            .send()
            .await?;
        decode(response, "generate content").await
    }

    /// Delete a store together with the documents it holds.
    pub async fn delete_store(&self, store_name: &str) -> Result<(), GeminiError> {
        let response = self
            .request(Method::DELETE, &format!("{API_VERSION}/{store_name}"))
            .query(&[("force", true)])
            .send()
            .await?;
        ensure_success(response, "delete store").await?;
        tracing::debug!(store = store_name, "File search store deleted");
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
    }
}

async fn ensure_success(
    response: reqwest::Response,
    action: &str,
) -> Result<reqwest::Response, GeminiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = GeminiError::UnexpectedStatus { status, body };
    tracing::error!(action, error = %error, "Gemini request failed");
    Err(error)
}

async fn decode<T>(response: reqwest::Response, action: &str) -> Result<T, GeminiError>
where
    T: DeserializeOwned,
{
    let response = ensure_success(response, action).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body)
        .map_err(|err| GeminiError::InvalidResponse(format!("{action}: {err}")))
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
