// HTTP layer - serves the one-page UI and the JSON API

pub mod routes;

use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};

use crate::downloader::{ExtractorConfig, ProgressSnapshot};

/// A completed buffered download waiting to be fetched by the
/// browser. Consumed (and the temp file deleted) by `GET /api/file`.
#[derive(Debug)]
pub struct BufferedDownload {
    pub path: PathBuf,
    pub filename: String,
}

/// Server configuration, resolved once at startup from environment
/// variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub download_dir: PathBuf,
    pub extractor: ExtractorConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("TUBEGRAB_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("TUBEGRAB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let download_dir = std::env::var("TUBEGRAB_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::download_dir().unwrap_or_else(|| PathBuf::from("./downloads"))
            });
        let extractor =
            ExtractorConfig::default().with_proxy(std::env::var("YTDLP_PROXY").ok());

        Self {
            host,
            port,
            download_dir,
            extractor,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Shared state for all handlers - one user session's worth.
///
/// `progress` has exactly one writer while a download runs (the
/// progress callback); the polling endpoint only reads. `run_lock`
/// serializes download runs so that holds.
pub struct AppState {
    pub config: ServerConfig,
    pub progress: RwLock<ProgressSnapshot>,
    pub buffered: Mutex<Option<BufferedDownload>>,
    pub run_lock: tokio::sync::Mutex<()>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            progress: RwLock::new(ProgressSnapshot::default()),
            buffered: Mutex::new(None),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::index))
        .route("/api/formats", post(routes::list_formats))
        .route("/api/download", post(routes::start_download))
        .route("/api/progress", get(routes::get_progress))
        .route("/api/file", get(routes::fetch_file))
        .route("/api/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}
