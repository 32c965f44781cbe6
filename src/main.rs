use docchat::{api, config, documents, logging};
use std::io;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    let config = config::get_config();
    logging::init_tracing(config.log_file.as_deref());

    let service = match documents::DocumentService::new() {
        Ok(service) => service,
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialize document service");
            std::process::exit(1);
        }
    };
    let app = api::create_router(Arc::new(service), config.max_upload_bytes);
    let app = api::with_static_assets(app, &config.static_dir);

    let listener = match config.server_port {
        Some(port) => TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await,
        None => bind_first_free(config.server_port_range.clone()).await,
    };
    let listener = match listener {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, "Failed to bind listener");
            std::process::exit(1);
        }
    };
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on http://{addr}");
    }

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "Server stopped");
        std::process::exit(1);
    }
}

/// Bind the first port in `ports` that is not already taken.
async fn bind_first_free(ports: RangeInclusive<u16>) -> io::Result<TcpListener> {
    let (first, last) = (*ports.start(), *ports.end());
    for port in ports {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => return Ok(listener),
            Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
            }
            Err(err) => return Err(err),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!("No available port found in range {first}-{last}"),
    ))
}
