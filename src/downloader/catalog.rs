// Format catalog - filters raw stream descriptors into the choices
// the UI actually offers.
//
// Two stages:
// - partition(): accept mp4 video at 720p+ and AAC-LC m4a audio, both
//   with a known file size, preserving extractor order
// - build_choices(): pair every accepted video with the single best
//   audio track and render a display label

use serde::Serialize;

use super::models::StreamDescriptor;

/// AAC-LC codec tag as produced by the reference encoder.
pub const AAC_LC_CODEC: &str = "mp4a.40.2";
/// Anything below this height is never offered.
pub const MIN_VIDEO_HEIGHT: u32 = 720;

const VIDEO_CONTAINER: &str = "mp4";
const AUDIO_CONTAINER: &str = "m4a";

/// A descriptor accepted as video. Height and size are known by
/// construction; rejects never make it into the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct VideoCandidate {
    pub format_id: String,
    pub ext: String,
    pub height: u32,
    pub filesize: u64,
}

impl VideoCandidate {
    /// Filter rule: height present, mp4 container, known size, 720p+.
    fn accept(f: &StreamDescriptor) -> Option<Self> {
        let height = f.height?;
        if height < MIN_VIDEO_HEIGHT || f.ext != VIDEO_CONTAINER {
            return None;
        }
        let filesize = f.filesize?;
        Some(Self {
            format_id: f.format_id.clone(),
            ext: f.ext.clone(),
            height,
            filesize,
        })
    }
}

/// A descriptor accepted as audio.
#[derive(Debug, Clone, Serialize)]
pub struct AudioCandidate {
    pub format_id: String,
    pub filesize: u64,
}

impl AudioCandidate {
    /// Filter rule: AAC-LC codec, m4a container, known size.
    fn accept(f: &StreamDescriptor) -> Option<Self> {
        if f.acodec.as_deref() != Some(AAC_LC_CODEC) || f.ext != AUDIO_CONTAINER {
            return None;
        }
        let filesize = f.filesize?;
        Some(Self {
            format_id: f.format_id.clone(),
            filesize,
        })
    }
}

/// Accepted video and audio candidates for one extracted URL.
/// Rebuilt from scratch on every submission; never cached.
#[derive(Debug, Clone, Default)]
pub struct FormatCatalog {
    pub video: Vec<VideoCandidate>,
    pub audio: Vec<AudioCandidate>,
}

impl FormatCatalog {
    /// Partition raw descriptors, dropping rejects silently and
    /// preserving extractor order in both sequences.
    pub fn partition(formats: &[StreamDescriptor]) -> Self {
        Self {
            video: formats.iter().filter_map(VideoCandidate::accept).collect(),
            audio: formats.iter().filter_map(AudioCandidate::accept).collect(),
        }
    }

    /// True when nothing usable can be offered. Either side empty
    /// means no merged output is possible.
    pub fn is_empty(&self) -> bool {
        self.video.is_empty() || self.audio.is_empty()
    }
}

/// One selectable pairing of a video stream with the best audio
/// stream. Presentation-only; lives for one selection interaction.
#[derive(Debug, Clone, Serialize)]
pub struct FormatChoice {
    pub video_format_id: String,
    pub audio_format_id: String,
    pub height: u32,
    pub total_size: u64,
    pub label: String,
}

/// Best audio = maximum filesize. On ties the FIRST maximum wins so
/// the pick is deterministic (`Iterator::max_by_key` would keep the
/// last one).
fn first_max_audio(audio: &[AudioCandidate]) -> Option<&AudioCandidate> {
    let mut best: Option<&AudioCandidate> = None;
    for candidate in audio {
        match best {
            Some(b) if candidate.filesize <= b.filesize => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Pair each video candidate with the best audio candidate, in video
/// input order. The best-audio pick is the same for every video, so it
/// is computed once. An empty audio list yields no choices; the caller
/// has already surfaced the empty-catalog message in that case.
pub fn build_choices(catalog: &FormatCatalog) -> Vec<FormatChoice> {
    let Some(best_audio) = first_max_audio(&catalog.audio) else {
        return Vec::new();
    };

    catalog
        .video
        .iter()
        .map(|video| {
            let total_size = video.filesize + best_audio.filesize;
            FormatChoice {
                video_format_id: video.format_id.clone(),
                audio_format_id: best_audio.format_id.clone(),
                height: video.height,
                total_size,
                label: format!(
                    "{}p - {} - {:.2} MB",
                    video.height,
                    video.ext,
                    total_size as f64 / 1_048_576.0
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_video(id: &str, height: Option<u32>, ext: &str, size: Option<u64>) -> StreamDescriptor {
        StreamDescriptor {
            format_id: id.to_string(),
            ext: ext.to_string(),
            height,
            vcodec: Some("avc1.640028".to_string()),
            acodec: Some("none".to_string()),
            filesize: size,
        }
    }

    fn make_audio(id: &str, acodec: &str, ext: &str, size: Option<u64>) -> StreamDescriptor {
        StreamDescriptor {
            format_id: id.to_string(),
            ext: ext.to_string(),
            height: None,
            vcodec: Some("none".to_string()),
            acodec: Some(acodec.to_string()),
            filesize: size,
        }
    }

    #[test]
    fn video_filter_requires_every_condition() {
        let ok = make_video("v", Some(1080), "mp4", Some(1));
        let cases = [
            (ok.clone(), true),
            (make_video("v", None, "mp4", Some(1)), false), // no height
            (make_video("v", Some(1080), "webm", Some(1)), false), // wrong container
            (make_video("v", Some(1080), "mp4", None), false), // unknown size
            (make_video("v", Some(719), "mp4", Some(1)), false), // below 720p
            (make_video("v", Some(720), "mp4", Some(1)), true), // boundary
        ];

        for (descriptor, expected) in cases {
            let catalog = FormatCatalog::partition(&[descriptor.clone()]);
            assert_eq!(
                catalog.video.len() == 1,
                expected,
                "descriptor: {:?}",
                descriptor
            );
        }
    }

    #[test]
    fn audio_filter_requires_every_condition() {
        let cases = [
            (make_audio("a", AAC_LC_CODEC, "m4a", Some(1)), true),
            (make_audio("a", "opus", "m4a", Some(1)), false), // wrong codec
            (make_audio("a", "mp4a.40.5", "m4a", Some(1)), false), // HE-AAC, not AAC-LC
            (make_audio("a", AAC_LC_CODEC, "webm", Some(1)), false), // wrong container
            (make_audio("a", AAC_LC_CODEC, "m4a", None), false), // unknown size
        ];

        for (descriptor, expected) in cases {
            let catalog = FormatCatalog::partition(&[descriptor.clone()]);
            assert_eq!(
                catalog.audio.len() == 1,
                expected,
                "descriptor: {:?}",
                descriptor
            );
        }
    }

    #[test]
    fn partition_preserves_extractor_order() {
        let formats = vec![
            make_video("v1080", Some(1080), "mp4", Some(100)),
            make_audio("a1", AAC_LC_CODEC, "m4a", Some(10)),
            make_video("v720", Some(720), "mp4", Some(50)),
            make_audio("a2", AAC_LC_CODEC, "m4a", Some(20)),
        ];

        let catalog = FormatCatalog::partition(&formats);
        let video_ids: Vec<&str> = catalog.video.iter().map(|v| v.format_id.as_str()).collect();
        let audio_ids: Vec<&str> = catalog.audio.iter().map(|a| a.format_id.as_str()).collect();
        assert_eq!(video_ids, ["v1080", "v720"]);
        assert_eq!(audio_ids, ["a1", "a2"]);
    }

    #[test]
    fn best_audio_unique_maximum_is_selected() {
        let formats = vec![
            make_video("v", Some(720), "mp4", Some(1_000)),
            make_audio("small", AAC_LC_CODEC, "m4a", Some(100)),
            make_audio("big", AAC_LC_CODEC, "m4a", Some(900)),
            make_audio("mid", AAC_LC_CODEC, "m4a", Some(500)),
        ];

        let choices = build_choices(&FormatCatalog::partition(&formats));
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].audio_format_id, "big");
    }

    #[test]
    fn best_audio_tie_picks_first_in_input_order() {
        let formats = vec![
            make_video("v", Some(720), "mp4", Some(1_000)),
            make_audio("first", AAC_LC_CODEC, "m4a", Some(900)),
            make_audio("second", AAC_LC_CODEC, "m4a", Some(900)),
        ];

        let choices = build_choices(&FormatCatalog::partition(&formats));
        assert_eq!(choices[0].audio_format_id, "first");
    }

    #[test]
    fn choice_order_follows_video_order() {
        let formats = vec![
            make_video("v1440", Some(1440), "mp4", Some(300)),
            make_video("v720", Some(720), "mp4", Some(100)),
            make_video("v1080", Some(1080), "mp4", Some(200)),
            make_audio("a", AAC_LC_CODEC, "m4a", Some(10)),
        ];

        let choices = build_choices(&FormatCatalog::partition(&formats));
        let ids: Vec<&str> = choices.iter().map(|c| c.video_format_id.as_str()).collect();
        assert_eq!(ids, ["v1440", "v720", "v1080"]);
    }

    #[test]
    fn label_renders_two_decimal_places() {
        let formats = vec![
            make_video("v", Some(1080), "mp4", Some(100_000_000)),
            make_video("low", Some(480), "mp4", Some(10_000_000)), // filtered out
            make_audio("a", AAC_LC_CODEC, "m4a", Some(5_000_000)),
        ];

        let catalog = FormatCatalog::partition(&formats);
        assert_eq!(catalog.video.len(), 1);
        assert_eq!(catalog.audio.len(), 1);

        let choices = build_choices(&catalog);
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].total_size, 105_000_000);
        assert_eq!(choices[0].label, "1080p - mp4 - 100.14 MB");
    }

    #[test]
    fn empty_catalog_when_nothing_passes() {
        let formats = vec![
            make_video("low", Some(360), "mp4", Some(1)),
            make_audio("opus", "opus", "webm", Some(1)),
        ];

        let catalog = FormatCatalog::partition(&formats);
        assert!(catalog.is_empty());
        assert!(build_choices(&catalog).is_empty());
    }

    #[test]
    fn video_without_audio_is_still_empty_catalog() {
        let formats = vec![make_video("v", Some(1080), "mp4", Some(1))];

        let catalog = FormatCatalog::partition(&formats);
        assert_eq!(catalog.video.len(), 1);
        assert!(catalog.is_empty());
        assert!(build_choices(&catalog).is_empty());
    }
}
