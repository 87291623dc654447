pub mod common;
pub mod qsv;

use crate::jobs::{save_job, Job, JobStage};
use crate::probe::ProbeResult;
use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Build the encoder argument list for one job; construction failure (e.g.
/// no video stream) is the caller's signal to mark the Job Failed without
/// ever spawning a subprocess.
pub fn build_command(
    input: &Path,
    temp_output: &Path,
    probe: &ProbeResult,
    is_web_like: bool,
) -> Result<Vec<String>> {
    qsv::build_qsv_command(input, temp_output, probe, is_web_like)
}

/// Invoke the encoder, parsing its `-progress` stream to keep the Job's
/// live-progress fields current, and its stderr to produce a failure reason
/// if it exits non-zero.
pub async fn execute_encode(
    ffmpeg_bin: &Path,
    job: &mut Job,
    args: &[String],
    job_state_dir: &Path,
) -> Result<()> {
    let mut cmd = Command::new(ffmpeg_bin);
    cmd.arg("-y").arg("-progress").arg("pipe:1").arg("-nostats");
    cmd.args(args);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let mut child = cmd.spawn().context("failed to spawn ffmpeg")?;

    let stdout = child
        .stdout
        .take()
        .context("failed to capture ffmpeg stdout")?;
    let stderr = child
        .stderr
        .take()
        .context("failed to capture ffmpeg stderr")?;

    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            collected.push(line);
        }
        collected
    });

    let mut reader = BufReader::new(stdout).lines();
    let mut total_size_bytes: Option<u64> = None;
    let mut out_time_secs: Option<f64> = None;
    let mut speed_x: Option<f64> = None;
    let mut last_save = Instant::now()
        .checked_sub(Duration::from_millis(750))
        .unwrap_or_else(Instant::now);

    job.stage = Some(JobStage::Encoding);
    save_job(job, job_state_dir)?;

    while let Some(line) = reader.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            match key {
                "out_time_ms" => {
                    if let Ok(ms) = value.parse::<u64>() {
                        out_time_secs = Some(ms as f64 / 1_000_000.0);
                    }
                }
                "out_time" => {
                    if out_time_secs.is_none() {
                        out_time_secs = parse_out_time(value);
                    }
                }
                "total_size" => {
                    if let Ok(size) = value.parse::<u64>() {
                        total_size_bytes = Some(size);
                    }
                }
                "speed" => {
                    if let Ok(speed) = value.trim_end_matches('x').parse::<f64>() {
                        speed_x = Some(speed);
                    }
                }
                "progress" if value == "end" => break,
                _ => {}
            }
        }

        if last_save.elapsed() >= Duration::from_millis(750) {
            update_job_progress(job, out_time_secs, total_size_bytes, speed_x, job_state_dir)?;
            last_save = Instant::now();
        }
    }

    update_job_progress(job, out_time_secs, total_size_bytes, speed_x, job_state_dir)?;
    job.stage = Some(JobStage::Verifying);
    save_job(job, job_state_dir)?;

    let status = child.wait().await.context("failed to wait for ffmpeg")?;
    let stderr_lines = stderr_task
        .await
        .context("failed to collect ffmpeg stderr")?;

    if !status.success() {
        let reason = most_recent_non_progress_line(&stderr_lines)
            .unwrap_or_else(|| format!("ffmpeg exited with status {:?}", status.code()));
        anyhow::bail!(reason);
    }

    Ok(())
}

/// The most recent stderr line that isn't an ffmpeg progress/frame line,
/// used as the concise failure reason per the executor's failure contract.
fn most_recent_non_progress_line(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .rev()
        .find(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("frame=") && !trimmed.starts_with("size=")
        })
        .cloned()
}

fn parse_out_time(val: &str) -> Option<f64> {
    let parts: Vec<&str> = val.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let h = parts.first()?.parse::<f64>().ok()?;
    let m = parts.get(1)?.parse::<f64>().ok()?;
    let s = parts.get(2)?.parse::<f64>().ok()?;
    Some(h * 3600.0 + m * 60.0 + s)
}

fn update_job_progress(
    job: &mut Job,
    out_time_secs: Option<f64>,
    total_size_bytes: Option<u64>,
    speed_x: Option<f64>,
    job_state_dir: &Path,
) -> Result<()> {
    if let Some(size) = total_size_bytes {
        job.encoded_bytes = Some(size);
    }
    if let Some(ots) = out_time_secs {
        job.encoded_duration = Some(ots);
    }

    if let (Some(ots), Some(total_dur)) = (out_time_secs, job.original_duration) {
        if total_dur > 0.0 {
            job.progress_percent = Some((ots / total_dur * 100.0).clamp(0.0, 100.0));
        }
    }

    if let (Some(ots), Some(total_dur), Some(speed)) =
        (out_time_secs, job.original_duration, speed_x)
    {
        if speed > 0.0 && total_dur > ots {
            let seconds_left = (total_dur - ots).max(0.0) / speed;
            job.eta = Some(Utc::now() + ChronoDuration::milliseconds((seconds_left * 1000.0) as i64));
        } else {
            job.eta = None;
        }
        if let Some(bytes) = job.encoded_bytes {
            if ots > 0.0 {
                job.speed_bps = Some(bytes as f64 / ots);
            }
        }
    }

    if let (Some(bytes), Some(pct)) = (job.encoded_bytes, job.progress_percent) {
        if pct > 0.1 {
            job.estimated_bytes = Some((bytes as f64 / (pct / 100.0)) as u64);
        }
    }

    save_job(job, job_state_dir)?;
    Ok(())
}

/// Delete a stale temporary output left behind by a crash or a prior retry.
pub fn clear_stale_temp_output(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to delete stale temp output {}", path.display()))?;
    }
    Ok(())
}

pub fn temp_output_path(input: &Path) -> PathBuf {
    qsv::temp_output_path(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_non_progress_line_skips_frame_stats() {
        let lines = vec![
            "frame= 100 fps=25".to_string(),
            "Error: invalid argument".to_string(),
            "frame= 101 fps=25".to_string(),
        ];
        assert_eq!(
            most_recent_non_progress_line(&lines),
            Some("Error: invalid argument".to_string())
        );
    }

    #[test]
    fn parse_out_time_handles_hms() {
        assert_eq!(parse_out_time("01:02:03.5"), Some(3723.5));
    }

    #[test]
    fn parse_out_time_rejects_malformed_input() {
        assert_eq!(parse_out_time("not-a-timestamp"), None);
    }

    #[test]
    fn clear_stale_temp_output_removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.av1-tmp.mkv");
        std::fs::write(&path, b"stale").unwrap();
        clear_stale_temp_output(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn clear_stale_temp_output_is_a_no_op_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.av1-tmp.mkv");
        clear_stale_temp_output(&path).unwrap();
    }
}
