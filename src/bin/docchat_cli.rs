//! Command-line client for a running docchat server.
//!
//! Mirrors the browser front end: upload a document, ask questions about it, list and delete
//! uploaded documents.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Parser)]
#[command(name = "docchat-cli", about = "Chat with documents through a docchat server")]
struct Cli {
    /// Base URL of the docchat server.
    #[arg(long, env = "DOCCHAT_SERVER", default_value = "http://127.0.0.1:8000")]
    server: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a .pdf, .txt, or .md document and wait until it is indexed.
    Upload { path: PathBuf },
    /// Ask a question about an uploaded document.
    Ask {
        #[arg(long)]
        store: String,
        question: String,
    },
    /// List uploaded documents.
    List,
    /// Delete an uploaded document.
    Delete { store_id: String },
}

#[derive(Deserialize)]
struct UploadReply {
    store_id: String,
    filename: String,
}

#[derive(Deserialize)]
struct ChatReply {
    answer: String,
}

#[derive(Deserialize)]
struct StoresReply {
    stores: Vec<StoreEntry>,
}

#[derive(Deserialize)]
struct StoreEntry {
    store_id: String,
    filename: String,
    #[serde(default)]
    uploaded_at: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .user_agent("docchat-cli/0.1")
        .build()
        .context("failed to build HTTP client")?;
    let base = cli.server.trim_end_matches('/').to_string();

    match cli.command {
        Command::Upload { path } => upload(&client, &base, &path).await,
        Command::Ask { store, question } => ask(&client, &base, &store, &question).await,
        Command::List => list(&client, &base).await,
        Command::Delete { store_id } => delete(&client, &base, &store_id).await,
    }
}

async fn upload(client: &reqwest::Client, base: &str, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?
        .to_string();
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let form = Form::new().part("file", Part::bytes(content).file_name(filename));
    let response = client
        .post(format!("{base}/upload"))
        .multipart(form)
        .send()
        .await
        .context("upload request failed")?;
    let reply: UploadReply = parse_reply(response).await?;
    println!("{}\t{}", reply.store_id, reply.filename);
    Ok(())
}

async fn ask(client: &reqwest::Client, base: &str, store_id: &str, question: &str) -> Result<()> {
    let response = client
        .post(format!("{base}/chat"))
        .json(&json!({ "question": question, "store_id": store_id }))
        .send()
        .await
        .context("chat request failed")?;
    let reply: ChatReply = parse_reply(response).await?;
    println!("{}", reply.answer);
    Ok(())
}

async fn list(client: &reqwest::Client, base: &str) -> Result<()> {
    let response = client
        .get(format!("{base}/stores"))
        .send()
        .await
        .context("list request failed")?;
    let reply: StoresReply = parse_reply(response).await?;
    if reply.stores.is_empty() {
        println!("No documents uploaded.");
    }
    for store in reply.stores {
        println!(
            "{}\t{}\t{}",
            store.store_id,
            store.filename,
            store.uploaded_at.unwrap_or_default()
        );
    }
    Ok(())
}

async fn delete(client: &reqwest::Client, base: &str, store_id: &str) -> Result<()> {
    let response = client
        .delete(format!("{base}/store/{store_id}"))
        .send()
        .await
        .context("delete request failed")?;
    let _: Value = parse_reply(response).await?;
    println!("Deleted {store_id}");
    Ok(())
}

async fn parse_reply<T>(response: reqwest::Response) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    let body = response.text().await.context("failed to read response")?;
    if !status.is_success() {
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| value.get("detail").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or(body);
        bail!("server returned {status}: {detail}");
    }
    serde_json::from_str(&body).with_context(|| format!("unexpected response body: {body}"))
}
