// Error types for extraction and download

use std::fmt;

#[derive(Debug, Clone)]
pub enum FetchError {
    /// The metadata extraction step failed (invalid URL, region lock,
    /// age gate, network trouble). Not retried internally.
    Extraction(String),

    /// Extraction succeeded but no stream passed the video/audio
    /// filters. Expected outcome, not a fault.
    EmptyCatalog,

    /// The download/mux run failed.
    Download(String),

    /// yt-dlp binary or Python module not found on this system.
    ToolNotFound(String),

    /// yt-dlp emitted JSON we could not decode.
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extraction(msg) => write!(f, "Extraction failed: {}", msg),
            Self::EmptyCatalog => write!(
                f,
                "No usable formats: nothing at 720p+ mp4 with a matching m4a audio track"
            ),
            Self::Download(msg) => write!(f, "Download failed: {}", msg),
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify raw yt-dlp stderr into a readable extraction error.
    ///
    /// yt-dlp reports everything as free text on stderr; a handful of
    /// markers cover the failures this tool actually runs into.
    pub fn from_extractor_stderr(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();

        if lower.contains("timed out") || lower.contains("timeout") {
            return Self::Extraction(
                "network timeout while contacting the video service".to_string(),
            );
        }
        if lower.contains("http error 429") || lower.contains("rate-limit") {
            return Self::Extraction(
                "the video service is rate-limiting requests, try again later".to_string(),
            );
        }
        if lower.contains("sign in to confirm your age") || lower.contains("age-restricted") {
            return Self::Extraction("this video is age-restricted".to_string());
        }
        if lower.contains("not available in your country")
            || lower.contains("geo restricted")
            || lower.contains("geo-restricted")
        {
            return Self::Extraction("this video is blocked in your region".to_string());
        }
        if lower.contains("private video") {
            return Self::Extraction("this video is private".to_string());
        }
        if lower.contains("video unavailable") || lower.contains("has been removed") {
            return Self::Extraction("this video is unavailable".to_string());
        }
        if lower.contains("unsupported url") || lower.contains("is not a valid url") {
            return Self::Extraction("unsupported or invalid URL".to_string());
        }
        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(stderr.trim().to_string());
        }

        // Fall back to the first ERROR: line, or the tail of stderr.
        let detail = stderr
            .lines()
            .find(|l| l.trim_start().starts_with("ERROR:"))
            .or_else(|| stderr.lines().rev().find(|l| !l.trim().is_empty()))
            .unwrap_or("unknown extractor error");
        Self::Extraction(detail.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_timeout() {
        let e = FetchError::from_extractor_stderr("ERROR: Connection timed out after 15s");
        assert!(matches!(e, FetchError::Extraction(ref m) if m.contains("timeout")));
    }

    #[test]
    fn classifies_geo_block() {
        let e = FetchError::from_extractor_stderr(
            "ERROR: [youtube] abc123: The uploader has not made this video available in your country",
        );
        assert!(matches!(e, FetchError::Extraction(ref m) if m.contains("region")));
    }

    #[test]
    fn classifies_invalid_url() {
        let e = FetchError::from_extractor_stderr("ERROR: Unsupported URL: http://nope");
        assert!(matches!(e, FetchError::Extraction(ref m) if m.contains("URL")));
    }

    #[test]
    fn falls_back_to_error_line() {
        let e = FetchError::from_extractor_stderr(
            "WARNING: something minor\nERROR: [youtube] weird new failure mode",
        );
        match e {
            FetchError::Extraction(m) => assert!(m.contains("weird new failure mode")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
