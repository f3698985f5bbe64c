// Extraction collaborators - query metadata without downloading media

pub mod cli;
pub mod python;
pub mod traits;

pub use cli::CliInfoExtractor;
pub use python::PythonInfoExtractor;
pub use traits::{ExtractorConfig, ExtractorMode, InfoExtractor};

use tracing::{info, warn};

use crate::downloader::errors::FetchError;
use crate::downloader::models::{StreamDescriptor, VideoInfo};

/// Decode one `--dump-json` document into video info plus the raw
/// stream list. Shared by both extractors; they emit the same JSON.
pub(crate) fn parse_video_info(stdout: &[u8]) -> Result<VideoInfo, FetchError> {
    let json_str = String::from_utf8_lossy(stdout);
    let json: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| FetchError::Parse(format!("Invalid JSON from yt-dlp: {}", e)))?;

    let formats = json["formats"]
        .as_array()
        .ok_or_else(|| FetchError::Parse("No formats array in JSON".to_string()))?
        .iter()
        .map(StreamDescriptor::from_json)
        .collect();

    Ok(VideoInfo {
        id: json["id"].as_str().unwrap_or("unknown").to_string(),
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
        duration_seconds: json["duration"].as_f64().unwrap_or(0.0) as u64,
        thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
        webpage_url: json["webpage_url"].as_str().unwrap_or("").to_string(),
        formats,
    })
}

/// Extract the stream list for one URL, honoring the configured mode.
///
/// Auto mode prefers the Python module when it is installed and falls
/// back to the CLI binary; failures are not retried beyond that single
/// fallback.
pub async fn extract_streams(
    url: &str,
    config: &ExtractorConfig,
) -> Result<VideoInfo, FetchError> {
    let python = PythonInfoExtractor::new();
    let cli = CliInfoExtractor::new();

    match config.mode {
        ExtractorMode::Python => python.extract(url, config).await,
        ExtractorMode::Cli => cli.extract(url, config).await,
        ExtractorMode::Auto => {
            if python.is_available() {
                match python.extract(url, config).await {
                    Ok(info) => {
                        info!(extractor = python.name(), "extraction succeeded");
                        return Ok(info);
                    }
                    // A missing tool or broken JSON might still work
                    // through the binary; real extraction failures
                    // (bad URL, region lock) would just repeat.
                    Err(e @ FetchError::Extraction(_)) => return Err(e),
                    Err(e) => {
                        warn!(extractor = python.name(), error = %e, "falling back to CLI");
                    }
                }
            }
            cli.extract(url, config).await
        }
    }
}
