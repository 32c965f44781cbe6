//! HTTP surface for docchat.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /upload` – Multipart upload (field `file`). Saves the document, creates a Gemini File
//!   Search store, and waits for indexing. Returns `{ success, store_id, filename, message }`.
//! - `POST /chat` – Ask a question about one uploaded document (`{ question, store_id }`).
//!   Returns `{ success, answer, filename }`.
//! - `GET /stores` – List live documents.
//! - `DELETE /store/:store_id` – Forget a document and remove its local copy.
//! - `GET /metrics` – Usage counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools.
//!
//! Failures are rendered as `{ "detail": "<message>" }` with a 400, 404, or 500 status.

use crate::documents::{DocumentApi, DocumentError};
use crate::metrics::MetricsSnapshot;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tower_http::services::{ServeDir, ServeFile};

/// Build the HTTP router exposing the document chat API surface.
///
/// Request bodies larger than `max_upload_bytes` are refused.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: DocumentApi + 'static,
{
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route("/chat", post(chat::<S>))
        .route("/stores", get(list_stores::<S>))
        .route("/store/:store_id", delete(delete_store::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// Serve `index.html` at `/` and the remaining browser assets under `/static`.
pub fn with_static_assets(router: Router, static_dir: &std::path::Path) -> Router {
    router
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    store_id: String,
    filename: String,
    message: &'static str,
}

/// Accept a multipart upload and hand the `file` field to the document pipeline.
///
/// Other fields are ignored. The request fails with 400 when no `file` field is present.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: DocumentApi,
{
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or(DocumentError::MissingFilename)?;
        let content = field.bytes().await?;

        let outcome = service.upload_document(filename, content).await?;
        tracing::info!(store_id = %outcome.store_id, filename = %outcome.filename, "Upload request completed");
        return Ok(Json(UploadResponse {
            success: true,
            store_id: outcome.store_id,
            filename: outcome.filename,
            message: "File uploaded and processed successfully",
        }));
    }

    Err(AppError::BadRequest("No file provided".into()))
}

/// Request body for `POST /chat`.
#[derive(Deserialize)]
struct ChatRequest {
    /// Natural language question.
    question: String,
    /// Identifier returned by `POST /upload`.
    store_id: String,
}

/// Success response for `POST /chat`.
#[derive(Serialize)]
struct ChatResponse {
    success: bool,
    answer: String,
    filename: String,
}

/// Answer a question about a previously uploaded document.
///
/// Malformed bodies keep the usual JSON error shape instead of axum's plain-text rejection.
async fn chat<S>(
    State(service): State<Arc<S>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError>
where
    S: DocumentApi,
{
    let Json(request) = request?;
    let answer = service.ask(&request.store_id, &request.question).await?;
    Ok(Json(ChatResponse {
        success: true,
        answer: answer.answer,
        filename: answer.filename,
    }))
}

/// Response body for `GET /stores`.
#[derive(Serialize)]
struct StoresResponse {
    stores: Vec<StoreSummary>,
}

#[derive(Serialize)]
struct StoreSummary {
    store_id: String,
    filename: String,
    content_type: &'static str,
    uploaded_at: String,
    size_bytes: u64,
    /// Hex SHA-256 of the uploaded bytes, for spotting duplicate uploads.
    content_sha256: String,
}

/// List live documents in upload order.
async fn list_stores<S>(State(service): State<Arc<S>>) -> Json<StoresResponse>
where
    S: DocumentApi,
{
    let stores = service
        .list_documents()
        .await
        .into_iter()
        .map(|record| StoreSummary {
            uploaded_at: record.uploaded_at.format(&Rfc3339).unwrap_or_default(),
            content_type: record.kind.mime_type(),
            store_id: record.store_id,
            filename: record.filename,
            size_bytes: record.size_bytes,
            content_sha256: record.content_sha256,
        })
        .collect();
    Json(StoresResponse { stores })
}

/// Response body for `DELETE /store/:store_id`.
#[derive(Serialize)]
struct DeleteResponse {
    success: bool,
    message: &'static str,
}

/// Forget a document.
async fn delete_store<S>(
    State(service): State<Arc<S>>,
    Path(store_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError>
where
    S: DocumentApi,
{
    service.delete_document(&store_id).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Store deleted successfully",
    }))
}

/// Return the usage counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: DocumentApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Upload a .pdf, .txt, or .md file as multipart field `file`. Blocks until Gemini has indexed it and returns { \"store_id\": string, \"filename\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "chat",
                method: "POST",
                path: "/chat",
                description: "Ask a question answered only from the uploaded document. Returns { \"answer\": string, \"filename\": string }.",
                request_example: Some(json!({
                    "question": "What does chapter 2 say about pricing?",
                    "store_id": "5f0c6d0e-8a4b-4bb8-9d55-0f6c2f0a7b11"
                })),
            },
            CommandDescriptor {
                name: "list_stores",
                method: "GET",
                path: "/stores",
                description: "List uploaded documents that are still available for chat.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete_store",
                method: "DELETE",
                path: "/store/{store_id}",
                description: "Forget an uploaded document and remove its local copy.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return upload, chat, and delete counters.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Document(DocumentError),
    Multipart(MultipartError),
    Json(JsonRejection),
    BadRequest(String),
}

fn document_status(error: &DocumentError) -> StatusCode {
    match error {
        DocumentError::UnsupportedFileType { .. }
        | DocumentError::MissingFilename
        | DocumentError::EmptyQuestion => StatusCode::BAD_REQUEST,
        DocumentError::StoreNotFound { .. } => StatusCode::NOT_FOUND,
        DocumentError::Storage(_)
        | DocumentError::RemoveLocalCopy { .. }
        | DocumentError::Provider(_)
        | DocumentError::IndexingTimeout { .. }
        | DocumentError::IndexingFailed(_)
        | DocumentError::EmptyAnswer => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::Document(error) => (document_status(&error), error.to_string()),
            Self::Multipart(error) => (error.status(), error.body_text()),
            Self::Json(rejection) => (rejection.status(), rejection.body_text()),
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %detail, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), detail = %detail, "Request rejected");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<DocumentError> for AppError {
    fn from(inner: DocumentError) -> Self {
        Self::Document(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(inner: JsonRejection) -> Self {
        Self::Json(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands, with_static_assets};
    use crate::documents::{
        ChatAnswer, DocumentApi, DocumentError, DocumentKind, StoreRecord, UploadOutcome,
    };
    use crate::metrics::MetricsSnapshot;
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, Bytes, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::sync::Arc;
    use time::OffsetDateTime;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "docchat-test-boundary";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[tokio::test]
    async fn commands_catalog_exposes_upload_and_chat() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let upload = commands
            .iter()
            .find(|cmd| cmd.name == "upload")
            .expect("upload command present");
        assert_eq!(upload.method, "POST");
        assert_eq!(upload.path, "/upload");
        assert!(commands.iter().any(|cmd| cmd.path == "/chat"));
    }

    #[tokio::test]
    async fn upload_route_forwards_file_field() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request("file", "guide.md", b"# Guide"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["store_id"], "stub-1");
        assert_eq!(json["filename"], "guide.md");

        let uploads = service.uploads.lock().await.clone();
        assert_eq!(uploads, vec![("guide.md".to_string(), b"# Guide".to_vec())]);
    }

    #[tokio::test]
    async fn upload_route_rejects_disallowed_extension() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request("file", "photo.png", b"\x89PNG"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(
            json["detail"],
            "File type not supported. Allowed types: .pdf, .txt, .md"
        );
    }

    #[tokio::test]
    async fn upload_route_requires_file_field() {
        let service = Arc::new(StubDocumentService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request("attachment", "notes.txt", b"hi"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "No file provided");
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn chat_on_unknown_store_is_not_found() {
        let app = create_router(Arc::new(StubDocumentService::default()), 1024);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/chat",
                json!({ "question": "Hello?", "store_id": "nope" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await["detail"],
            "Document not found. Please upload a document first."
        );
    }

    #[tokio::test]
    async fn chat_returns_answer_and_filename() {
        let service = Arc::new(StubDocumentService::with_record("s-1", "menu.pdf"));
        let app = create_router(service, 1024);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/chat",
                json!({ "question": "Price of tea?", "store_id": "s-1" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["answer"], "echo: Price of tea?");
        assert_eq!(json["filename"], "menu.pdf");
    }

    #[tokio::test]
    async fn provider_failures_become_server_errors() {
        let service = Arc::new(StubDocumentService::with_record("s-1", "menu.pdf"));
        let app = create_router(service, 1024);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/chat",
                json!({ "question": "fail", "store_id": "s-1" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["detail"],
            "The model returned an empty answer"
        );
    }

    #[tokio::test]
    async fn listing_and_delete_reflect_live_stores() {
        let service = Arc::new(StubDocumentService::with_record("s-1", "menu.pdf"));
        let app = create_router(service.clone(), 1024);

        let listed = json_body(
            app.clone()
                .oneshot(empty_request(Method::GET, "/stores"))
                .await
                .expect("list"),
        )
        .await;
        assert_eq!(listed["stores"][0]["store_id"], "s-1");
        assert_eq!(listed["stores"][0]["filename"], "menu.pdf");
        assert_eq!(listed["stores"][0]["uploaded_at"], "1970-01-01T00:00:00Z");
        assert_eq!(listed["stores"][0]["content_type"], "application/pdf");
        assert_eq!(listed["stores"][0]["size_bytes"], 3);
        assert_eq!(listed["stores"][0]["content_sha256"], ABC_SHA256);

        let deleted = app
            .clone()
            .oneshot(empty_request(Method::DELETE, "/store/s-1"))
            .await
            .expect("delete");
        assert_eq!(deleted.status(), StatusCode::OK);
        assert_eq!(json_body(deleted).await["success"], true);

        let listed = json_body(
            app.clone()
                .oneshot(empty_request(Method::GET, "/stores"))
                .await
                .expect("list"),
        )
        .await;
        assert_eq!(listed["stores"], json!([]));

        let again = app
            .oneshot(empty_request(Method::DELETE, "/store/s-1"))
            .await
            .expect("delete again");
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_without_store_id_is_rejected_as_json() {
        let app = create_router(Arc::new(StubDocumentService::default()), 1024);

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/chat",
                json!({ "question": "Hello?" }),
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let detail = json_body(response).await["detail"]
            .as_str()
            .expect("detail string")
            .to_string();
        assert!(detail.contains("store_id"), "detail: {detail}");
    }

    #[tokio::test]
    async fn malformed_chat_body_is_rejected_as_json() {
        let app = create_router(Arc::new(StubDocumentService::default()), 1024);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{\"question\": "))
            .expect("request");
        let response = app.oneshot(request).await.expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn static_assets_are_served_next_to_the_api() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<h1>docchat</h1>").expect("index");
        std::fs::write(dir.path().join("app.js"), "console.log('hi');").expect("script");
        let app = with_static_assets(
            create_router(Arc::new(StubDocumentService::default()), 1024),
            dir.path(),
        );

        let index = app
            .clone()
            .oneshot(empty_request(Method::GET, "/"))
            .await
            .expect("index");
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(text_body(index).await, "<h1>docchat</h1>");

        let script = app
            .clone()
            .oneshot(empty_request(Method::GET, "/static/app.js"))
            .await
            .expect("script");
        assert_eq!(script.status(), StatusCode::OK);
        assert_eq!(text_body(script).await, "console.log('hi');");

        let missing = app
            .clone()
            .oneshot(empty_request(Method::GET, "/static/missing.css"))
            .await
            .expect("missing asset");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let api = app
            .oneshot(empty_request(Method::GET, "/stores"))
            .await
            .expect("api still routed");
        assert_eq!(api.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_upload_is_refused() {
        let service = Arc::new(StubDocumentService::default());
        let app: Router = create_router(service.clone(), 64);

        let response = app
            .oneshot(multipart_request("file", "big.txt", &[b'x'; 512]))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(service.uploads.lock().await.is_empty());
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    fn json_request(method: Method, uri: &str, payload: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .expect("request")
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    async fn text_body(response: axum::response::Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        String::from_utf8(body.to_vec()).expect("utf-8 body")
    }

    #[derive(Default)]
    struct StubDocumentService {
        uploads: Mutex<Vec<(String, Vec<u8>)>>,
        records: Mutex<Vec<StoreRecord>>,
    }

    impl StubDocumentService {
        fn with_record(store_id: &str, filename: &str) -> Self {
            let stub = Self::default();
            stub.records.try_lock().expect("fresh lock").push(StoreRecord {
                store_id: store_id.into(),
                remote_store_name: format!("fileSearchStores/{store_id}"),
                filename: filename.into(),
                file_path: PathBuf::from(format!("uploads/{store_id}.pdf")),
                kind: DocumentKind::Pdf,
                size_bytes: 3,
                content_sha256: ABC_SHA256.into(),
                uploaded_at: OffsetDateTime::UNIX_EPOCH,
            });
            stub
        }
    }

    #[async_trait]
    impl DocumentApi for StubDocumentService {
        async fn upload_document(
            &self,
            filename: String,
            content: Bytes,
        ) -> Result<UploadOutcome, DocumentError> {
            if DocumentKind::from_filename(&filename).is_none() {
                return Err(DocumentError::UnsupportedFileType {
                    allowed: DocumentKind::allowed_extensions(),
                });
            }
            let mut uploads = self.uploads.lock().await;
            uploads.push((filename.clone(), content.to_vec()));
            Ok(UploadOutcome {
                store_id: format!("stub-{}", uploads.len()),
                filename,
            })
        }

        async fn ask(&self, store_id: &str, question: &str) -> Result<ChatAnswer, DocumentError> {
            let records = self.records.lock().await;
            let record = records
                .iter()
                .find(|record| record.store_id == store_id)
                .ok_or_else(|| DocumentError::StoreNotFound {
                    store_id: store_id.to_string(),
                })?;
            if question == "fail" {
                return Err(DocumentError::EmptyAnswer);
            }
            Ok(ChatAnswer {
                answer: format!("echo: {question}"),
                filename: record.filename.clone(),
            })
        }

        async fn list_documents(&self) -> Vec<StoreRecord> {
            self.records.lock().await.clone()
        }

        async fn delete_document(&self, store_id: &str) -> Result<(), DocumentError> {
            let mut records = self.records.lock().await;
            let before = records.len();
            records.retain(|record| record.store_id != store_id);
            if records.len() == before {
                return Err(DocumentError::StoreNotFound {
                    store_id: store_id.to_string(),
                });
            }
            Ok(())
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot::default()
        }
    }
}
