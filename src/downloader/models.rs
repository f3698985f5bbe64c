// Common data models for the downloader

use serde::{Deserialize, Serialize};

/// One stream rendition reported by yt-dlp, without the media bytes.
///
/// Fields mirror the entries of the `formats` array in `--dump-json`
/// output. Anything absent in the JSON is `None` here; parsing a
/// descriptor never fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Opaque selector token yt-dlp uses to pick this exact rendition
    /// (e.g. "137", "140").
    pub format_id: String,
    /// Container / file extension (mp4, webm, m4a).
    pub ext: String,
    /// Video height in pixels, absent for audio-only streams.
    pub height: Option<u32>,
    /// Video codec (avc1, vp9, av01, "none").
    pub vcodec: Option<String>,
    /// Audio codec (mp4a.40.2, opus, "none").
    pub acodec: Option<String>,
    /// Exact file size in bytes, when the extractor knows it.
    pub filesize: Option<u64>,
}

impl StreamDescriptor {
    /// Build a descriptor from one entry of the yt-dlp formats array.
    pub fn from_json(f: &serde_json::Value) -> Self {
        Self {
            format_id: f["format_id"].as_str().unwrap_or("").to_string(),
            ext: f["ext"].as_str().unwrap_or("").to_string(),
            height: f["height"].as_u64().map(|h| h as u32),
            vcodec: f["vcodec"].as_str().map(|s| s.to_string()),
            acodec: f["acodec"].as_str().map(|s| s.to_string()),
            filesize: f["filesize"].as_u64(),
        }
    }
}

/// Video metadata plus the full stream list, as extracted for one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration_seconds: u64,
    pub thumbnail: String,
    pub webpage_url: String,
    pub formats: Vec<StreamDescriptor>,
}

/// Latest progress observed from a running download.
///
/// Exactly one writer exists while a download is in flight (the
/// progress callback); the interface layer reads it back on a poll.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressSnapshot {
    /// True from download start until completion or failure.
    pub active: bool,
    /// 0.0..=1.0 for driving a progress indicator.
    pub fraction: f32,
    /// Pre-formatted percent string, e.g. "42.3%".
    pub percent: String,
    /// Pre-formatted speed string, e.g. "1.24MiB/s".
    pub speed: String,
    /// Pre-formatted ETA string, e.g. "03:12".
    pub eta: String,
    /// Free-form status line for display.
    pub status: String,
}

impl ProgressSnapshot {
    /// Snapshot at the moment a download is kicked off.
    pub fn starting() -> Self {
        Self {
            active: true,
            fraction: 0.0,
            status: "Starting download...".to_string(),
            ..Self::default()
        }
    }

    /// Terminal snapshot once the run is over.
    pub fn finished(status: impl Into<String>) -> Self {
        Self {
            active: false,
            fraction: 1.0,
            percent: "100%".to_string(),
            status: status.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_from_full_json_entry() {
        let entry = json!({
            "format_id": "137",
            "ext": "mp4",
            "height": 1080,
            "vcodec": "avc1.640028",
            "acodec": "none",
            "filesize": 100_000_000u64,
        });

        let d = StreamDescriptor::from_json(&entry);
        assert_eq!(d.format_id, "137");
        assert_eq!(d.ext, "mp4");
        assert_eq!(d.height, Some(1080));
        assert_eq!(d.vcodec.as_deref(), Some("avc1.640028"));
        assert_eq!(d.filesize, Some(100_000_000));
    }

    #[test]
    fn descriptor_absent_fields_become_none() {
        let entry = json!({ "format_id": "sb0", "ext": "mhtml" });

        let d = StreamDescriptor::from_json(&entry);
        assert_eq!(d.height, None);
        assert_eq!(d.vcodec, None);
        assert_eq!(d.acodec, None);
        assert_eq!(d.filesize, None);
    }
}
