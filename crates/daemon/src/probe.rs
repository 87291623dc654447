use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::process::Command;

/// Structured result of probing a media file with the external prober.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    pub format: FormatInfo,
    pub video_streams: Vec<VideoStream>,
    pub audio_streams: Vec<AudioStream>,
    pub subtitle_streams: Vec<SubtitleStream>,
}

impl ProbeResult {
    /// The stream selected for encoding: the one with `default` disposition,
    /// falling back to the first video stream.
    pub fn main_video_stream(&self) -> Option<&VideoStream> {
        select_main_video_stream(&self.video_streams)
    }

    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    pub fn has_av1(&self) -> bool {
        self.main_video_stream()
            .map(|v| v.codec_name.eq_ignore_ascii_case("av1"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FormatInfo {
    pub format_name: String,
    pub duration: Option<f64>,
    pub size: u64,
    pub bitrate: Option<u64>,
    pub tags: HashMap<String, String>,
}

impl FormatInfo {
    /// `muxing_app`/`writing_library`, whichever is present, lowercased for matching.
    pub fn muxer_tags_lower(&self) -> Vec<String> {
        ["muxing_app", "writing_library"]
            .iter()
            .filter_map(|key| self.tags.get(*key))
            .map(|v| v.to_lowercase())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoStream {
    pub index: usize,
    pub codec_name: String,
    pub width: i32,
    pub height: i32,
    pub bitrate: Option<u64>,
    /// `r_frame_rate`: the container's declared constant frame rate.
    pub frame_rate: Option<String>,
    /// `avg_frame_rate`: the measured average; differs from `frame_rate` under VFR.
    pub avg_frame_rate: Option<String>,
    pub pix_fmt: Option<String>,
    pub bit_depth: Option<u8>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioStream {
    pub index: usize,
    pub codec_name: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubtitleStream {
    pub index: usize,
    pub codec_name: String,
    pub language: Option<String>,
}

// Internal ffprobe JSON structures. Every numeric field is decoded through
// `NumericField` because ffprobe emits some as JSON numbers and others as
// numeric strings depending on version and field.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<NumericField>,
    size: Option<NumericField>,
    bit_rate: Option<NumericField>,
    tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: String,
    codec_name: String,
    width: Option<NumericField>,
    height: Option<NumericField>,
    bit_rate: Option<NumericField>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    bits_per_raw_sample: Option<NumericField>,
    disposition: Option<FfprobeDisposition>,
    tags: Option<FfprobeTags>,
}

#[derive(Debug, Deserialize)]
struct FfprobeDisposition {
    default: Option<NumericField>,
}

#[derive(Debug, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
}

/// A field ffprobe may emit as a JSON number, a numeric string, or null.
/// Null and unparseable strings normalize to zero.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    fn as_f64(&self) -> f64 {
        match self {
            NumericField::Number(n) => *n,
            NumericField::Text(s) => s.parse().unwrap_or(0.0),
        }
    }

    fn as_u64(&self) -> u64 {
        self.as_f64().max(0.0) as u64
    }

    fn as_i32(&self) -> i32 {
        self.as_f64() as i32
    }

    fn as_u8(&self) -> u8 {
        self.as_f64().clamp(0.0, u8::MAX as f64) as u8
    }
}

fn numeric_u64(field: Option<NumericField>) -> u64 {
    field.map(|f| f.as_u64()).unwrap_or(0)
}

/// Execute the prober on a file and parse its JSON output.
pub async fn probe_file(ffprobe_bin: &Path, path: &Path) -> Result<ProbeResult> {
    let output = Command::new(ffprobe_bin)
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(path)
        .output()
        .await
        .context("failed to execute ffprobe")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ffprobe failed: {}", stderr.trim());
    }

    let stdout = String::from_utf8(output.stdout).context("ffprobe output is not valid UTF-8")?;

    let ffprobe_output: FfprobeOutput =
        serde_json::from_str(&stdout).context("failed to parse ffprobe JSON output")?;

    parse_ffprobe_output(ffprobe_output)
}

fn parse_ffprobe_output(output: FfprobeOutput) -> Result<ProbeResult> {
    let format = if let Some(fmt) = output.format {
        FormatInfo {
            format_name: fmt.format_name.unwrap_or_default(),
            duration: fmt.duration.map(|d| d.as_f64()),
            size: numeric_u64(fmt.size),
            bitrate: fmt.bit_rate.map(|b| b.as_u64()),
            tags: fmt.tags.unwrap_or_default(),
        }
    } else {
        FormatInfo::default()
    };

    let streams = output.streams.unwrap_or_default();
    let mut video_streams = Vec::new();
    let mut audio_streams = Vec::new();
    let mut subtitle_streams = Vec::new();

    for stream in streams {
        match stream.codec_type.as_str() {
            "video" => {
                if let (Some(width), Some(height)) = (&stream.width, &stream.height) {
                    video_streams.push(VideoStream {
                        index: stream.index,
                        codec_name: stream.codec_name.clone(),
                        width: width.as_i32(),
                        height: height.as_i32(),
                        bitrate: stream.bit_rate.map(|b| b.as_u64()),
                        frame_rate: stream.r_frame_rate.clone(),
                        avg_frame_rate: stream.avg_frame_rate.clone(),
                        pix_fmt: stream.pix_fmt.clone(),
                        bit_depth: stream.bits_per_raw_sample.map(|b| b.as_u8()),
                        is_default: stream
                            .disposition
                            .and_then(|d| d.default)
                            .map(|v| v.as_i32() == 1)
                            .unwrap_or(false),
                    });
                }
            }
            "audio" => {
                audio_streams.push(AudioStream {
                    index: stream.index,
                    codec_name: stream.codec_name.clone(),
                    language: stream.tags.and_then(|t| t.language),
                });
            }
            "subtitle" => {
                subtitle_streams.push(SubtitleStream {
                    index: stream.index,
                    codec_name: stream.codec_name.clone(),
                    language: stream.tags.and_then(|t| t.language),
                });
            }
            _ => {}
        }
    }

    Ok(ProbeResult {
        format,
        video_streams,
        audio_streams,
        subtitle_streams,
    })
}

/// Prefers the stream with `default` disposition, falls back to the first video stream.
pub fn select_main_video_stream(streams: &[VideoStream]) -> Option<&VideoStream> {
    streams
        .iter()
        .find(|s| s.is_default)
        .or_else(|| streams.first())
}
