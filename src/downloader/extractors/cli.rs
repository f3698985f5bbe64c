// CLI InfoExtractor - uses the native `yt-dlp` binary
//
// No Python dependency, easier to distribute, but slightly more likely
// to trip bot detection than the Python module.

use async_trait::async_trait;
use std::process::Command as StdCommand;
use tracing::debug;

use super::parse_video_info;
use super::traits::{ExtractorConfig, InfoExtractor};
use crate::downloader::errors::FetchError;
use crate::downloader::models::VideoInfo;
use crate::downloader::tools::find_ytdlp;
use crate::downloader::utils::run_output_with_timeout;

/// CLI-based info extractor using the yt-dlp binary.
pub struct CliInfoExtractor {
    ytdlp_path: String,
}

impl CliInfoExtractor {
    pub fn new() -> Self {
        Self {
            ytdlp_path: find_ytdlp(),
        }
    }

    fn has_ytdlp_binary(&self) -> bool {
        match StdCommand::new(&self.ytdlp_path).arg("--version").output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(&self, url: &str, config: &ExtractorConfig) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            config.timeout_seconds.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        if let Some(proxy) = &config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(url.to_string());
        args
    }
}

impl Default for CliInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn is_available(&self) -> bool {
        self.has_ytdlp_binary()
    }

    async fn extract(
        &self,
        url: &str,
        config: &ExtractorConfig,
    ) -> Result<VideoInfo, FetchError> {
        if !self.is_available() {
            return Err(FetchError::ToolNotFound(
                "yt-dlp binary not found".to_string(),
            ));
        }

        let args = self.build_args(url, config);
        debug!(extractor = self.name(), url, "running {}", self.ytdlp_path);

        // Leave headroom over the socket timeout for process startup.
        let deadline = config.timeout_seconds as u64 + 15;
        let output = run_output_with_timeout(&self.ytdlp_path, args, deadline)
            .await
            .map_err(FetchError::Extraction)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::from_extractor_stderr(&stderr));
        }

        parse_video_info(&output.stdout)
    }
}
