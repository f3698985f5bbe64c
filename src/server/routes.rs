// API route handlers

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::downloader::{
    build_choices, download_merged, extract_streams, tools, FetchError, FormatCatalog,
    ProgressSnapshot,
};
use crate::downloader::utils::sanitize_filename;

use super::{AppState, BufferedDownload};

#[derive(Deserialize)]
pub struct FormatsBody {
    pub url: String,
}

#[derive(Deserialize)]
pub struct DownloadBody {
    pub url: String,
    pub video_format_id: String,
    pub audio_format_id: String,
    /// Source title, used to derive the output filename.
    #[serde(default)]
    pub title: Option<String>,
    /// "disk" saves into the configured directory; "buffer" stages a
    /// temp file for the browser to fetch.
    #[serde(default = "default_delivery")]
    pub delivery: String,
}

fn default_delivery() -> String {
    "disk".to_string()
}

fn set_progress(state: &AppState, snapshot: ProgressSnapshot) {
    if let Ok(mut guard) = state.progress.write() {
        *guard = snapshot;
    }
}

/// GET / - the one-page UI
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// GET /api/health - external tool availability
pub async fn health() -> Json<serde_json::Value> {
    let status = tools::ytdlp_status();
    Json(json!({ "ytdlp": status }))
}

/// GET /api/progress - latest progress snapshot (UI polls this)
pub async fn get_progress(State(state): State<Arc<AppState>>) -> Json<ProgressSnapshot> {
    let snapshot = state
        .progress
        .read()
        .map(|guard| guard.clone())
        .unwrap_or_default();
    Json(snapshot)
}

/// POST /api/formats - extract streams for a URL and return the
/// selectable choices. A fresh extraction on every call; nothing is
/// cached across submissions.
pub async fn list_formats(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FormatsBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let url = body.url.trim().to_string();
    if url.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "URL is required" })),
        );
    }

    let info = match extract_streams(&url, &state.config.extractor).await {
        Ok(info) => info,
        Err(e) => {
            warn!(url, error = %e, "extraction failed");
            return (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })));
        }
    };

    let catalog = FormatCatalog::partition(&info.formats);
    if catalog.is_empty() {
        info!(url, "no usable formats after filtering");
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": FetchError::EmptyCatalog.to_string() })),
        );
    }

    let choices: Vec<serde_json::Value> = build_choices(&catalog)
        .iter()
        .enumerate()
        .map(|(index, c)| {
            json!({
                "index": index,
                "label": c.label,
                "height": c.height,
                "total_size": c.total_size,
                "video_format_id": c.video_format_id,
                "audio_format_id": c.audio_format_id,
            })
        })
        .collect();

    let duration = format!(
        "{}:{:02}",
        info.duration_seconds / 60,
        info.duration_seconds % 60
    );

    info!(url, choices = choices.len(), "catalog built");
    (
        StatusCode::OK,
        Json(json!({
            "title": info.title,
            "uploader": info.uploader,
            "duration": duration,
            "thumbnail": info.thumbnail,
            "choices": choices,
        })),
    )
}

/// POST /api/download - run the download/mux to completion.
///
/// Blocks this request until yt-dlp finishes; the progress callback
/// keeps the shared snapshot current for `GET /api/progress`.
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DownloadBody>,
) -> (StatusCode, Json<serde_json::Value>) {
    let url = body.url.trim().to_string();
    if url.is_empty() || body.video_format_id.is_empty() || body.audio_format_id.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "url, video_format_id and audio_format_id are required" })),
        );
    }

    // One download at a time; a second submission waits its turn so
    // the progress snapshot keeps a single writer.
    let _running = state.run_lock.lock().await;

    let filename = format!(
        "{}.mp4",
        sanitize_filename(body.title.as_deref().unwrap_or("video"))
    );

    let buffered = body.delivery == "buffer";
    let output_path = if buffered {
        std::env::temp_dir().join(format!("tubegrab-{}.mp4", Uuid::new_v4()))
    } else {
        let dir = &state.config.download_dir;
        if let Err(e) = std::fs::create_dir_all(dir) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Cannot create download directory: {}", e) })),
            );
        }
        dir.join(&filename)
    };

    set_progress(&state, ProgressSnapshot::starting());

    let result = download_merged(
        &url,
        &body.video_format_id,
        &body.audio_format_id,
        &output_path,
        &state.config.extractor,
        |update| {
            set_progress(
                &state,
                ProgressSnapshot {
                    active: true,
                    fraction: update.fraction,
                    percent: update.percent,
                    speed: update.speed,
                    eta: update.eta,
                    status: update.status,
                },
            );
        },
    )
    .await;

    match result {
        Ok(path) => {
            set_progress(&state, ProgressSnapshot::finished("Download complete"));
            if buffered {
                if let Ok(mut slot) = state.buffered.lock() {
                    // A previous unfetched file is superseded; drop it
                    // from disk too.
                    if let Some(old) = slot.take() {
                        let _ = std::fs::remove_file(&old.path);
                    }
                    *slot = Some(BufferedDownload {
                        path: path.clone(),
                        filename: filename.clone(),
                    });
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Download ready",
                        "delivery": "buffer",
                        "filename": filename,
                    })),
                )
            } else {
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": format!("Video saved to {}", path.display()),
                        "delivery": "disk",
                        "path": path.display().to_string(),
                    })),
                )
            }
        }
        Err(e) => {
            warn!(url, error = %e, "download failed");
            set_progress(
                &state,
                ProgressSnapshot {
                    active: false,
                    status: format!("Error: {}", e),
                    ..ProgressSnapshot::default()
                },
            );
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })))
        }
    }
}

/// GET /api/file - hand the buffered download to the browser.
///
/// Consumes the staged temp file: its bytes are read into memory and
/// the file is deleted before the response goes out, so nothing
/// accumulates on disk.
pub async fn fetch_file(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let staged = state
        .buffered
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "No buffered download is ready" })),
            )
        })?;

    let bytes = tokio::fs::read(&staged.path).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("Cannot read buffered file: {}", e) })),
        )
    })?;
    let _ = tokio::fs::remove_file(&staged.path).await;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        staged.filename.replace('"', "_")
    );

    info!(filename = staged.filename, size = bytes.len(), "serving buffered download");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
