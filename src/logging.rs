//! Tracing setup: a compact stdout layer plus an append-only file sink.
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_LOG_FILE: &str = "logs/docchat.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Events are also appended to `log_file`,
/// or to `logs/docchat.log` when none is configured. A log file that cannot be opened only
/// disables the file layer.
pub fn init_tracing(log_file: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer);

    let path = log_file.map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), Path::to_path_buf);
    match open_log_file(&path) {
        Ok(file) => {
            let file_layer = fmt::layer()
                .with_writer(non_blocking(file))
                .with_ansi(false)
                .compact();
            registry.with(file_layer).init();
        }
        Err(err) => {
            registry.init();
            tracing::warn!(path = %path.display(), error = %err, "File logging disabled");
        }
    }
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn non_blocking(file: File) -> NonBlocking {
    let (writer, guard) = tracing_appender::non_blocking(file);
    // Only the first guard is kept; init_tracing runs once per process.
    let _ = LOG_GUARD.set(guard);
    writer
}
