use crate::probe::{select_main_video_stream, ProbeResult};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    WebLike,
    DiscLike,
    Unknown,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SourceClassification {
    pub source_type: SourceType,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl SourceClassification {
    /// Unknown is coerced to web-like: web-safe encoder flags are a superset
    /// that stays correct for disc content at a small cost.
    pub fn is_web_like(&self) -> bool {
        !matches!(self.source_type, SourceType::DiscLike)
    }
}

const WEB_LIKE_THRESHOLD: f64 = 2.0;
const DISC_LIKE_THRESHOLD: f64 = -2.0;

const FILENAME_WEB_TOKENS: &[&str] = &[
    "web-dl", "webrip", "webhd", "webdl", "nf", "amzn", "dsnp", "hmax", "hulu", "atvp", "disney",
    "appletv",
];
const FILENAME_DISC_TOKENS: &[&str] = &[
    "bluray", "bdrip", "brrip", "remux", "uhd", "bd25", "bd50", "blu-ray", "bd-remux", "bdr",
];
const MUXER_WEB_TOKENS: &[&str] = &["shaka-packager", "libwebm", "applehttp", "dash", "hls", "ffmpeg"];
const MUXER_DISC_TOKENS: &[&str] = &["mkvmerge", "libmatroska", "makemkv", "tsmuxer"];

/// Classify a source file as WebLike, DiscLike, or Unknown.
///
/// An override sidecar (`.websafe`/`.nowebsafe`) short-circuits the signal
/// table with a fixed score. Otherwise every signal below contributes a
/// signed weight to a running total that is thresholded at the end.
pub fn classify_source(path: &Path, probe: &ProbeResult) -> SourceClassification {
    if crate::sidecars::has_websafe_override(path) {
        return SourceClassification {
            source_type: SourceType::WebLike,
            score: 10.0,
            reasons: vec!["sibling .websafe override present".to_string()],
        };
    }
    if crate::sidecars::has_nowebsafe_override(path) {
        return SourceClassification {
            source_type: SourceType::DiscLike,
            score: -10.0,
            reasons: vec!["sibling .nowebsafe override present".to_string()],
        };
    }

    let mut score = 0.0;
    let mut reasons = Vec::new();
    let mut add = |weight: f64, reason: String| {
        score += weight;
        reasons.push(reason);
    };

    let file_stem_lower = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let dir_lower = path
        .parent()
        .map(|p| p.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let extension_lower = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    for token in FILENAME_WEB_TOKENS {
        if file_stem_lower.contains(token) {
            add(3.0, format!("filename contains web token '{token}'"));
        }
    }
    for token in FILENAME_DISC_TOKENS {
        if file_stem_lower.contains(token) {
            add(-4.0, format!("filename contains disc token '{token}'"));
        }
    }
    for token in FILENAME_WEB_TOKENS {
        if dir_lower.contains(token) {
            add(1.0, format!("directory name contains web token '{token}'"));
        }
    }
    for token in FILENAME_DISC_TOKENS {
        if dir_lower.contains(token) {
            add(-2.0, format!("directory name contains disc token '{token}'"));
        }
    }

    match extension_lower.as_str() {
        "mp4" | "mov" | "webm" => add(2.0, format!("extension '{extension_lower}' is web-typical")),
        "mkv" => add(-1.0, "extension 'mkv' is disc-typical".to_string()),
        _ => {}
    }

    let format_name_lower = probe.format.format_name.to_lowercase();
    let is_matroska_container = extension_lower == "mkv" || format_name_lower.contains("matroska");

    // ffprobe reports every Matroska-family container, including real .webm
    // files, as format_name "matroska,webm" — the extension is the only
    // reliable way to tell a true WebM file from a disc-style mkv.
    if format_name_lower.contains("mp4") || format_name_lower.contains("mov") || extension_lower == "webm"
    {
        add(2.5, format!("format name '{format_name_lower}' is an mp4/mov/webm family"));
    } else if format_name_lower.contains("matroska") {
        add(-1.5, "format name is matroska".to_string());
    }

    for tag in probe.format.muxer_tags_lower() {
        for token in MUXER_WEB_TOKENS {
            if tag.contains(token) {
                add(3.0, format!("muxer tag '{tag}' matches web-leaning muxer '{token}'"));
            }
        }
        for token in MUXER_DISC_TOKENS {
            if tag.contains(token) {
                add(-3.0, format!("muxer tag '{tag}' matches disc-leaning muxer '{token}'"));
            }
        }
    }

    if let Some(video) = select_main_video_stream(&probe.video_streams) {
        if !is_matroska_container {
            if is_vfr(video) {
                add(2.5, "variable frame rate detected outside matroska".to_string());
            }
            if video.width % 2 != 0 {
                add(1.5, "odd width outside matroska".to_string());
            }
            if video.height % 2 != 0 {
                add(1.5, "odd height outside matroska".to_string());
            }
        }

        if video.width > 0 && video.height > 0 {
            let aspect = video.width as f64 / video.height as f64;
            if !(1.3..=2.5).contains(&aspect) {
                add(0.5, format!("aspect ratio {aspect:.3} outside [1.3, 2.5]"));
            }
        }

        if video.height >= 1080 {
            if let Some(bpp) = bits_per_pixel(video) {
                if bpp < 0.1 {
                    add(1.0, format!("bits per pixel {bpp:.4} below 0.1 at >=1080p"));
                } else if bpp > 0.3 {
                    add(-1.0, format!("bits per pixel {bpp:.4} above 0.3 at >=1080p"));
                }
            }
        }
    }

    let source_type = if score >= WEB_LIKE_THRESHOLD {
        SourceType::WebLike
    } else if score <= DISC_LIKE_THRESHOLD {
        SourceType::DiscLike
    } else {
        SourceType::Unknown
    };

    SourceClassification {
        source_type,
        score,
        reasons,
    }
}

fn is_vfr(video: &crate::probe::VideoStream) -> bool {
    match (&video.frame_rate, &video.avg_frame_rate) {
        (Some(r), Some(avg)) => r != avg && !r.is_empty() && !avg.is_empty(),
        _ => false,
    }
}

fn bits_per_pixel(video: &crate::probe::VideoStream) -> Option<f64> {
    let bitrate = video.bitrate? as f64;
    let pixels = (video.width as f64) * (video.height as f64);
    if pixels <= 0.0 {
        return None;
    }
    Some(bitrate / pixels / fps(video))
}

fn fps(video: &crate::probe::VideoStream) -> f64 {
    parse_rational(video.frame_rate.as_deref()).unwrap_or(24.0)
}

fn parse_rational(value: Option<&str>) -> Option<f64> {
    let value = value?;
    if let Some((num, den)) = value.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        Some(num / den)
    } else {
        value.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{AudioStream, FormatInfo, SubtitleStream, VideoStream};
    use std::path::PathBuf;

    fn probe_with(format_name: &str, video: VideoStream) -> ProbeResult {
        ProbeResult {
            format: FormatInfo {
                format_name: format_name.to_string(),
                duration: Some(3600.0),
                size: 2_000_000_000,
                bitrate: None,
                tags: Default::default(),
            },
            video_streams: vec![video],
            audio_streams: Vec::<AudioStream>::new(),
            subtitle_streams: Vec::<SubtitleStream>::new(),
        }
    }

    fn even_video(codec: &str) -> VideoStream {
        VideoStream {
            index: 0,
            codec_name: codec.to_string(),
            width: 1920,
            height: 1080,
            bitrate: Some(4_000_000),
            frame_rate: Some("24/1".to_string()),
            avg_frame_rate: Some("24/1".to_string()),
            pix_fmt: Some("yuv420p".to_string()),
            bit_depth: Some(8),
            is_default: true,
        }
    }

    #[test]
    fn webrip_filename_classifies_web_like() {
        let probe = probe_with("mov,mp4,m4a,3gp,3g2,mj2", even_video("h264"));
        let result = classify_source(&PathBuf::from("/lib/Show.S01E01.WEBRip.mp4"), &probe);
        assert_eq!(result.source_type, SourceType::WebLike);
    }

    #[test]
    fn bluray_remux_classifies_disc_like() {
        let probe = probe_with("matroska,webm", even_video("h264"));
        let result = classify_source(&PathBuf::from("/lib/Movie.2020.BluRay.REMUX.mkv"), &probe);
        assert_eq!(result.source_type, SourceType::DiscLike);
    }

    #[test]
    fn vfr_signal_ignored_inside_matroska() {
        let mut video = even_video("h264");
        video.avg_frame_rate = Some("23.9/1".to_string());
        let probe = probe_with("matroska,webm", video);
        let result = classify_source(&PathBuf::from("/lib/Ambiguous.File.mkv"), &probe);
        assert!(!result
            .reasons
            .iter()
            .any(|r| r.contains("variable frame rate")));
    }

    #[test]
    fn vfr_signal_applies_outside_matroska() {
        let mut video = even_video("h264");
        video.avg_frame_rate = Some("23.9/1".to_string());
        let probe = probe_with("mov,mp4,m4a,3gp,3g2,mj2", video);
        let result = classify_source(&PathBuf::from("/lib/Ambiguous.File.mp4"), &probe);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("variable frame rate")));
    }

    #[test]
    fn websafe_override_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Movie.mkv");
        std::fs::write(&source, b"x").unwrap();
        std::fs::write(dir.path().join("Movie.mkv.websafe"), b"").unwrap();
        let probe = probe_with("matroska,webm", even_video("h264"));
        let result = classify_source(&source, &probe);
        assert_eq!(result.source_type, SourceType::WebLike);
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn real_webm_extension_gets_web_signal_despite_matroska_format_name() {
        let probe = probe_with("matroska,webm", even_video("vp9"));
        let result = classify_source(&PathBuf::from("/lib/clip.webm"), &probe);
        assert!(result
            .reasons
            .iter()
            .any(|r| r.contains("mp4/mov/webm family")));
        assert!(!result.reasons.iter().any(|r| r.contains("format name is matroska")));
    }

    #[test]
    fn unknown_is_treated_as_web_like() {
        let classification = SourceClassification {
            source_type: SourceType::Unknown,
            score: 0.0,
            reasons: vec![],
        };
        assert!(classification.is_web_like());
    }

    #[test]
    fn disc_like_is_not_web_like() {
        let classification = SourceClassification {
            source_type: SourceType::DiscLike,
            score: -5.0,
            reasons: vec![],
        };
        assert!(!classification.is_web_like());
    }
}
