// Python InfoExtractor - uses `python -m yt_dlp`
//
// Matches what the yt_dlp module itself would return and tends to be
// treated more gently by YouTube than the standalone binary.

use async_trait::async_trait;
use std::process::Command as StdCommand;
use tracing::debug;

use super::parse_video_info;
use super::traits::{ExtractorConfig, InfoExtractor};
use crate::downloader::errors::FetchError;
use crate::downloader::models::VideoInfo;
use crate::downloader::utils::run_output_with_timeout;

/// Interpreter override so a venv can be used instead of the system
/// python (e.g. YTDLP_PYTHON=/path/to/venv/bin/python).
pub fn python_cmd() -> String {
    std::env::var("YTDLP_PYTHON").unwrap_or_else(|_| "python3".to_string())
}

fn python_has_module(module: &str) -> bool {
    let code = format!("import {}", module);
    match StdCommand::new(python_cmd()).args(["-c", &code]).output() {
        Ok(out) => out.status.success(),
        Err(_) => false,
    }
}

/// Info extractor backed by the yt_dlp Python module.
pub struct PythonInfoExtractor;

impl PythonInfoExtractor {
    pub fn new() -> Self {
        Self
    }

    fn build_args(url: &str, config: &ExtractorConfig) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            "yt_dlp".to_string(),
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

impl Default for PythonInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for PythonInfoExtractor {
    fn name(&self) -> &'static str {
        "python-yt-dlp"
    }

    fn is_available(&self) -> bool {
        python_has_module("yt_dlp")
    }

    async fn extract(
        &self,
        url: &str,
        config: &ExtractorConfig,
    ) -> Result<VideoInfo, FetchError> {
        if !self.is_available() {
            return Err(FetchError::ToolNotFound(
                "python module yt_dlp not installed".to_string(),
            ));
        }

        let py = python_cmd();
        let args = Self::build_args(url, config);
        debug!(extractor = self.name(), url, "running {} -m yt_dlp", py);

        let deadline = config.timeout_seconds as u64 + 15;
        let output = run_output_with_timeout(&py, args, deadline)
            .await
            .map_err(FetchError::Extraction)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::from_extractor_stderr(&stderr));
        }

        parse_video_info(&output.stdout)
    }
}
