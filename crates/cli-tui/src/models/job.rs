use std::path::PathBuf;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Status of a transcoding job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

/// Source classification assigned by the daemon's classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    WebLike,
    DiscLike,
    Unknown,
}

/// Live stage reported while a job is Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Probing,
    Encoding,
    Verifying,
    Replacing,
    Complete,
}

/// Mirrors the daemon's on-disk job record. The dashboard only reads this
/// file; it never writes one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub source_path: PathBuf,
    pub output_path: Option<PathBuf>,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    pub status: JobStatus,
    pub reason: Option<String>,

    pub original_bytes: Option<u64>,
    pub new_bytes: Option<u64>,
    pub estimated_bytes: Option<u64>,

    pub video_codec: Option<String>,
    pub video_bitrate: Option<u64>,
    pub video_width: Option<i32>,
    pub video_height: Option<i32>,
    pub video_frame_rate: Option<String>,
    pub container_name: Option<String>,
    pub audio_track_count: usize,
    pub subtitle_track_count: usize,
    pub source_bit_depth: Option<u8>,
    pub source_pix_fmt: Option<String>,
    pub is_hdr: Option<bool>,
    pub original_duration: Option<f64>,

    pub source_class: SourceType,
    pub classification_score: f64,
    pub classification_reasons: Vec<String>,
    pub is_web_like: bool,

    pub global_quality_used: Option<u8>,
    pub preset_used: Option<String>,
    pub encoder_used: Option<String>,

    #[serde(default)]
    pub stage: Option<JobStage>,
    #[serde(default)]
    pub encoded_bytes: Option<u64>,
    #[serde(default)]
    pub encoded_duration: Option<f64>,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub speed_bps: Option<f64>,
}

/// Load all jobs from the job state directory. Files the daemon is mid-write
/// on (`.tmp` siblings) and unparseable files are skipped rather than
/// surfaced as an error: one corrupt record shouldn't blank the dashboard.
pub fn load_all_jobs(dir: &Path) -> Result<Vec<Job>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut jobs = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read job state directory: {}", dir.display()))?
    {
        let entry = entry.context("failed to read directory entry")?;
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };

        if let Ok(job) = serde_json::from_str::<Job>(&content) {
            jobs.push(job);
        }
    }

    Ok(jobs)
}
