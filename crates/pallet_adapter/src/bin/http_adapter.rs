#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pallet_adapter::{
    init_tracing, AdapterConfig, AdapterError, AdapterHealthResponse, AdapterRuntime,
    SearchRequest, TraceAdapterResponse, TraceQuery,
};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AdapterConfig::from_env();
    let addr = config.http_bind_addr()?;
    info!(
        data_dir = %config.data_dir.display(),
        cache_ttl_secs = config.cache_ttl.as_secs(),
        "initializing traceability runtime"
    );
    let runtime = Arc::new(AdapterRuntime::from_config(&config));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/trace", get(trace))
        .route("/v1/trace/search", post(search))
        .route("/v1/trace/qr.png", get(qr_png))
        .with_state(runtime);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AdapterError::Bind { addr, source })?;
    info!("pallet_adapter_http listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AdapterError::Serve)?;

    info!("pallet_adapter_http stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn healthz(
    State(runtime): State<Arc<AdapterRuntime>>,
) -> (StatusCode, Json<AdapterHealthResponse>) {
    (StatusCode::OK, Json(runtime.health_report(None)))
}

async fn trace(
    State(runtime): State<Arc<AdapterRuntime>>,
    Query(query): Query<TraceQuery>,
) -> (StatusCode, Json<TraceAdapterResponse>) {
    let (status, response) = runtime.trace(query.palete.as_deref(), None);
    (status, Json(response))
}

async fn search(
    State(runtime): State<Arc<AdapterRuntime>>,
    Json(request): Json<SearchRequest>,
) -> (StatusCode, Json<TraceAdapterResponse>) {
    let (status, response) = runtime.search(request, None);
    (status, Json(response))
}

async fn qr_png(
    State(runtime): State<Arc<AdapterRuntime>>,
    Query(query): Query<TraceQuery>,
) -> Response {
    match runtime.qr_download(query.palete.as_deref(), None) {
        Ok(download) => (
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", download.file_name),
                ),
            ],
            download.png,
        )
            .into_response(),
        Err((status, response)) => (status, Json(response)).into_response(),
    }
}
