// Download/mux invocation - runs yt-dlp with an exact video+audio
// format pair and streams progress back to the caller.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use super::errors::FetchError;
use super::extractors::ExtractorConfig;
use super::tools::find_ytdlp;

/// One observation from the running download. All display fields are
/// pre-formatted yt-dlp strings; `fraction` is derived from the
/// percent for driving a progress indicator.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub fraction: f32,
    pub percent: String,
    pub speed: String,
    pub eta: String,
    pub status: String,
}

/// Parse one `--newline` stdout line from yt-dlp.
///
/// Progress lines look like:
/// `[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)`
pub fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)\s+at\s+(\d+\.?\d*\s*\w+/s)(?:\s+ETA\s+(\S+))?"
        ).unwrap();
        static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
        static ref MERGE_RE: Regex = Regex::new(r"\[Merger?\]\s+Merging").unwrap();
        static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent_num: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map(|m| m.as_str()).unwrap_or("?");
        let speed = caps.get(3).map(|m| m.as_str()).unwrap_or("?");
        let eta = caps.get(4).map(|m| m.as_str()).unwrap_or("");

        let status = if eta.is_empty() {
            format!("{:.1}% of {} at {}", percent_num, size, speed)
        } else {
            format!("{:.1}% of {} at {} ETA {}", percent_num, size, speed, eta)
        };

        return Some(ProgressUpdate {
            fraction: (percent_num / 100.0).clamp(0.0, 1.0),
            percent: format!("{:.1}%", percent_num),
            speed: speed.trim().to_string(),
            eta: eta.to_string(),
            status,
        });
    }

    if let Some(caps) = DEST_RE.captures(line) {
        let filename = caps.get(1).map(|m| m.as_str()).unwrap_or("file");
        let short_name: String = filename
            .split('/')
            .next_back()
            .unwrap_or(filename)
            .chars()
            .take(60)
            .collect();
        return Some(ProgressUpdate {
            fraction: 0.0,
            percent: String::new(),
            speed: String::new(),
            eta: String::new(),
            status: format!("Starting: {}", short_name),
        });
    }

    if MERGE_RE.is_match(line) {
        return Some(ProgressUpdate {
            fraction: 0.99,
            percent: "99%".to_string(),
            speed: String::new(),
            eta: String::new(),
            status: "Merging video and audio...".to_string(),
        });
    }

    if ALREADY_RE.is_match(line) {
        return Some(ProgressUpdate {
            fraction: 1.0,
            percent: "100%".to_string(),
            speed: String::new(),
            eta: String::new(),
            status: "File already downloaded".to_string(),
        });
    }

    None
}

fn build_args(
    url: &str,
    video_format_id: &str,
    audio_format_id: &str,
    output_path: &Path,
    config: &ExtractorConfig,
) -> Vec<String> {
    let mut args = vec![
        "-f".to_string(),
        format!("{}+{}", video_format_id, audio_format_id),
        "--merge-output-format".to_string(),
        "mp4".to_string(),
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--no-update".to_string(),
        "--socket-timeout".to_string(),
        config.timeout_seconds.to_string(),
        "--retries".to_string(),
        "5".to_string(),
        "--fragment-retries".to_string(),
        "50".to_string(),
        "-o".to_string(),
        output_path.to_string_lossy().to_string(),
    ];

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args.push(url.to_string());
    args
}

/// Extract the lines worth showing a user from a failed run's stderr.
fn stderr_preview(stderr: &str) -> String {
    let important: Vec<&str> = stderr
        .lines()
        .map(|l| l.trim())
        .filter(|s| {
            s.starts_with("ERROR:")
                || s.contains("HTTP Error")
                || s.contains("Requested format is not available")
        })
        .take(2)
        .collect();

    if !important.is_empty() {
        important.join(" | ")
    } else {
        stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("unknown error")
            .chars()
            .take(200)
            .collect()
    }
}

/// Download both streams and mux them into a single mp4 at exactly
/// `output_path`, invoking `on_progress` for every parsed line.
///
/// Runs to completion or failure; there is no cancellation. On failure
/// any partial output at `output_path` is removed so it is never
/// served to anyone.
pub async fn download_merged(
    url: &str,
    video_format_id: &str,
    audio_format_id: &str,
    output_path: &Path,
    config: &ExtractorConfig,
    mut on_progress: impl FnMut(ProgressUpdate),
) -> Result<PathBuf, FetchError> {
    let ytdlp_path = find_ytdlp();
    let args = build_args(url, video_format_id, audio_format_id, output_path, config);
    info!(
        url,
        format = format!("{}+{}", video_format_id, audio_format_id),
        output = %output_path.display(),
        "starting yt-dlp download"
    );

    let mut child = TokioCommand::new(&ytdlp_path)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| FetchError::Download(format!("Failed to start yt-dlp: {}", e)))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| FetchError::Download("Failed to capture yt-dlp stdout".to_string()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| FetchError::Download("Failed to capture yt-dlp stderr".to_string()))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf).await;
        buf
    });

    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(update) = parse_progress_line(&line) {
            on_progress(update);
        }
        if line.contains("[download]") || line.contains("[Merger]") {
            debug!(target: "tubegrab::ytdlp", "{}", line);
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|e| FetchError::Download(format!("Process error: {}", e)))?;
    let stderr_output = stderr_task.await.unwrap_or_default();

    if status.success() {
        info!(output = %output_path.display(), "download and merge complete");
        return Ok(output_path.to_path_buf());
    }

    // Never leave a partial merged file where a later request could
    // pick it up.
    if output_path.exists() {
        let _ = std::fs::remove_file(output_path);
    }

    Err(FetchError::Download(stderr_preview(&stderr_output)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_progress_line() {
        let line = "[download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)";
        let update = parse_progress_line(line).unwrap();
        assert!((update.fraction - 0.062).abs() < 1e-6);
        assert_eq!(update.percent, "6.2%");
        assert_eq!(update.speed, "420.30KiB/s");
        assert_eq!(update.eta, "12:32");
        assert!(update.status.contains("343.72MiB"));
    }

    #[test]
    fn parses_progress_line_without_eta() {
        let line = "[download] 100.0% of 10.00MiB at 2.00MiB/s";
        let update = parse_progress_line(line).unwrap();
        assert_eq!(update.fraction, 1.0);
        assert_eq!(update.eta, "");
    }

    #[test]
    fn parses_destination_line() {
        let line = "[download] Destination: /tmp/My Video.f137.mp4";
        let update = parse_progress_line(line).unwrap();
        assert_eq!(update.fraction, 0.0);
        assert!(update.status.contains("My Video.f137.mp4"));
    }

    #[test]
    fn parses_merger_line() {
        let line = r#"[Merger] Merging formats into "/tmp/My Video.mp4""#;
        let update = parse_progress_line(line).unwrap();
        assert!(update.status.contains("Merging"));
        assert!(update.fraction >= 0.99);
    }

    #[test]
    fn parses_already_downloaded() {
        let line = "[download] /tmp/My Video.mp4 has already been downloaded";
        let update = parse_progress_line(line).unwrap();
        assert_eq!(update.fraction, 1.0);
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert!(parse_progress_line("[youtube] abc123: Downloading webpage").is_none());
        assert!(parse_progress_line("").is_none());
    }

    #[test]
    fn args_request_exact_pair_and_mp4_merge() {
        let config = ExtractorConfig::default();
        let args = build_args(
            "https://example.com/v",
            "137",
            "140",
            Path::new("/tmp/out.mp4"),
            &config,
        );
        let joined = args.join(" ");
        assert!(joined.contains("-f 137+140"));
        assert!(joined.contains("--merge-output-format mp4"));
        assert!(joined.contains("-o /tmp/out.mp4"));
        assert!(joined.ends_with("https://example.com/v"));
    }

    #[test]
    fn stderr_preview_prefers_error_lines() {
        let stderr = "WARNING: noise\nERROR: HTTP Error 403: Forbidden\nmore noise";
        assert_eq!(stderr_preview(stderr), "ERROR: HTTP Error 403: Forbidden");
    }
}
