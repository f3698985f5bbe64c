// yt-dlp binary discovery and version probing

use serde::Serialize;
use std::process::Command;

/// Availability of the external downloader, reported at startup and
/// by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub path: String,
    pub version: Option<String>,
    pub is_available: bool,
}

/// Locate the yt-dlp binary: common install paths first, then PATH.
pub fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = Command::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    // Last resort: hope it's in PATH.
    "yt-dlp".to_string()
}

/// Probe the discovered binary with `--version`.
pub fn ytdlp_status() -> ToolStatus {
    let path = find_ytdlp();
    let version = match Command::new(&path).arg("--version").output() {
        Ok(out) if out.status.success() => {
            Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
        }
        _ => None,
    };

    ToolStatus {
        is_available: version.is_some(),
        path,
        version,
    }
}
