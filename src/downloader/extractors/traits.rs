// InfoExtractor trait and shared configuration

use async_trait::async_trait;
use std::fmt;

use crate::downloader::errors::FetchError;
use crate::downloader::models::VideoInfo;

/// Extraction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractorMode {
    /// Python module yt_dlp (better for YouTube, avoids bot detection)
    Python,
    /// CLI binary yt-dlp (no Python dependency)
    Cli,
    /// Auto-select: Python when installed, CLI fallback
    #[default]
    Auto,
}

impl fmt::Display for ExtractorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Cli => write!(f, "cli"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Configuration for info extraction and the download run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub mode: ExtractorMode,
    /// SOCKS5/HTTP proxy URL passed straight to yt-dlp.
    pub proxy: Option<String>,
    /// Socket timeout handed to yt-dlp, also the hard deadline for
    /// extraction runs.
    pub timeout_seconds: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            mode: ExtractorMode::Auto,
            proxy: None,
            timeout_seconds: 30,
        }
    }
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_mode(mut self, mode: ExtractorMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Trait for info extractors.
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available on this system
    fn is_available(&self) -> bool;

    /// Extract metadata and the full stream list for a URL. No media
    /// bytes are downloaded.
    async fn extract(&self, url: &str, config: &ExtractorConfig)
        -> Result<VideoInfo, FetchError>;
}
