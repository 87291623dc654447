use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::classify::{SourceClassification, SourceType};
use crate::probe::ProbeResult;
use crate::scan::CandidateFile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    // Identity
    pub id: String,
    pub source_path: PathBuf,
    pub output_path: Option<PathBuf>,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    // Status
    pub status: JobStatus,
    pub reason: Option<String>,

    // Sizing
    pub original_bytes: Option<u64>,
    pub new_bytes: Option<u64>,
    pub estimated_bytes: Option<u64>,

    // Source descriptors (captured at scan, informational for the dashboard)
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

    // Classification
    pub source_class: SourceType,
    pub classification_score: f64,
    pub classification_reasons: Vec<String>,
    pub is_web_like: bool,

    // Encoding parameters used for this attempt
    pub global_quality_used: Option<u8>,
    pub preset_used: Option<String>,
    pub encoder_used: Option<String>,

    // Live progress (optional; populated only while Running)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<JobStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_bps: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

/// Live stage for dashboard progress; optional and best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Probing,
    Encoding,
    Verifying,
    Replacing,
    Complete,
}

pub fn create_job(
    file: CandidateFile,
    probe: ProbeResult,
    classification: SourceClassification,
) -> Job {
    let main_video = probe.main_video_stream();

    // HDR detection from pixel format.
    let is_hdr = main_video.and_then(|v| v.pix_fmt.as_ref()).map(|fmt| {
        fmt.contains("p010")
            || fmt.contains("p016")
            || fmt.contains("yuv420p10")
            || fmt.contains("yuv422p10")
            || fmt.contains("yuv444p10")
            || fmt.contains("yuv420p12")
    });

    let is_web_like = classification.is_web_like();

    Job {
        id: Uuid::new_v4().to_string(),
        source_path: file.path,
        output_path: None,
        created_at: Utc::now(),
        started_at: None,
        finished_at: None,
        status: JobStatus::Pending,
        reason: None,
        original_bytes: Some(file.size_bytes),
        new_bytes: None,
        estimated_bytes: None,
        video_codec: main_video.map(|v| v.codec_name.clone()),
        video_bitrate: main_video.and_then(|v| v.bitrate),
        video_width: main_video.map(|v| v.width),
        video_height: main_video.map(|v| v.height),
        video_frame_rate: main_video.and_then(|v| v.frame_rate.clone()),
        container_name: Some(probe.format.format_name.clone()),
        audio_track_count: probe.audio_streams.len(),
        subtitle_track_count: probe.subtitle_streams.len(),
        source_bit_depth: main_video.and_then(|v| v.bit_depth),
        source_pix_fmt: main_video.and_then(|v| v.pix_fmt.clone()),
        is_hdr,
        original_duration: probe.format.duration,
        source_class: classification.source_type,
        classification_score: classification.score,
        classification_reasons: classification.reasons,
        is_web_like,
        global_quality_used: None,
        preset_used: None,
        encoder_used: None,
        stage: None,
        encoded_bytes: None,
        encoded_duration: None,
        progress_percent: None,
        eta: None,
        speed_bps: None,
    }
}

pub fn save_job(job: &Job, state_dir: &Path) -> Result<()> {
    use std::fs;
    use std::io::Write;

    fs::create_dir_all(state_dir)?;

    let json = serde_json::to_string_pretty(job)?;

    let job_file = state_dir.join(format!("{}.json", job.id));
    let temp_file = state_dir.join(format!("{}.json.tmp", job.id));

    let mut file = fs::File::create(&temp_file)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&temp_file, &job_file)?;

    Ok(())
}

pub fn load_all_jobs(state_dir: &Path) -> Result<Vec<Job>> {
    use std::fs;

    if !state_dir.exists() {
        return Ok(vec![]);
    }

    let mut jobs = Vec::new();

    for entry in fs::read_dir(state_dir)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        if let Some(ext) = path.extension() {
            if ext != "json" {
                continue;
            }
        } else {
            continue;
        }

        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|s| s.ends_with(".tmp"))
            .unwrap_or(false)
        {
            continue;
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Job>(&contents) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse job file");
                    continue;
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read job file");
                continue;
            }
        }
    }

    Ok(jobs)
}

/// Linear scan over the loaded set; acceptable because library sizes are
/// bounded by files, not requests.
pub fn find_by_source_path(state_dir: &Path, source_path: &Path) -> Result<Option<Job>> {
    let jobs = load_all_jobs(state_dir)?;
    Ok(jobs.into_iter().find(|j| j.source_path == source_path))
}

pub fn update_job_status(job: &mut Job, status: JobStatus, state_dir: &Path) -> Result<()> {
    job.status = status;
    match status {
        JobStatus::Running => job.started_at = Some(Utc::now()),
        JobStatus::Success | JobStatus::Failed | JobStatus::Skipped => {
            job.finished_at = Some(Utc::now())
        }
        _ => {}
    }

    save_job(job, state_dir)?;

    Ok(())
}
