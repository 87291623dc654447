use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::DaemonConfig;
use crate::encode::{build_command, clear_stale_temp_output, execute_encode, temp_output_path};
use crate::gates::{evaluate_admission, mark_permanent_skip, AdmissionOutcome};
use crate::jobs::{create_job, find_by_source_path, save_job, update_job_status, Job, JobStatus};
use crate::replace::atomic_replace;
use crate::scan::{scan_libraries, CandidateFile};
use crate::sidecars::write_why_file;
use crate::size_gate::{check_size_gate, SizeGateResult};
use crate::stable::{check_stability, STABILITY_WAIT};

/// Scan pass → drain Pending jobs sequentially through the executor → sleep
/// → repeat. Only one encoder invocation ever runs at a time, enforced by
/// simply awaiting each job before starting the next — no semaphore needed.
pub async fn run_daemon_loop(config: DaemonConfig) -> Result<()> {
    info!(scan_interval_sec = config.scan_interval_sec, "starting daemon main loop");

    std::fs::create_dir_all(&config.job_state_dir)?;

    let shutting_down = Arc::new(AtomicBool::new(false));
    install_signal_handler(shutting_down.clone());

    loop {
        info!("starting scan pass");

        match scan_libraries(&config.library_roots) {
            Ok(candidates) => {
                info!(count = candidates.len(), "candidate files found");
                for candidate in candidates {
                    if let Err(e) = admit_candidate(&candidate, &config).await {
                        error!(path = %candidate.path.display(), error = %e, "error admitting candidate");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "error scanning library roots");
            }
        }

        match pending_jobs(&config) {
            Ok(pending) => {
                info!(count = pending.len(), "draining pending jobs");
                for mut job in pending {
                    if shutting_down.load(Ordering::SeqCst) {
                        info!("shutdown requested, stopping before next job");
                        return Ok(());
                    }
                    if let Err(e) = run_job(&mut job, &config).await {
                        error!(job_id = %job.id, error = %e, "error running job");
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "error loading pending jobs");
            }
        }

        if shutting_down.load(Ordering::SeqCst) {
            info!("shutdown requested, exiting before next scan");
            return Ok(());
        }

        info!(seconds = config.scan_interval_sec, "scan pass complete, sleeping");
        sleep(Duration::from_secs(config.scan_interval_sec)).await;
    }
}

fn install_signal_handler(flag: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, will stop after the in-flight job finishes");
            flag.store(true, Ordering::SeqCst);
        }
    });
}

fn pending_jobs(config: &DaemonConfig) -> Result<Vec<Job>> {
    let jobs = crate::jobs::load_all_jobs(&config.job_state_dir)?;
    Ok(jobs
        .into_iter()
        .filter(|j| j.status == JobStatus::Pending)
        .collect())
}

/// Scanner steps 2-9: evaluate one candidate and admit/refresh/reject its Job.
async fn admit_candidate(candidate: &CandidateFile, config: &DaemonConfig) -> Result<()> {
    let existing = find_by_source_path(&config.job_state_dir, &candidate.path)?;

    match evaluate_admission(candidate, existing.as_ref(), config).await? {
        AdmissionOutcome::AlreadySucceeded => Ok(()),
        AdmissionOutcome::Rejected { reason, permanent } => {
            debug!(path = %candidate.path.display(), reason = %reason, permanent, "candidate rejected");
            Ok(())
        }
        AdmissionOutcome::Admitted {
            probe,
            classification,
        } => {
            let job = match existing {
                Some(old_job) if matches!(old_job.status, JobStatus::Failed | JobStatus::Skipped) => {
                    let mut refreshed = create_job(candidate.clone(), probe, classification);
                    refreshed.id = old_job.id;
                    refreshed.created_at = old_job.created_at;
                    refreshed
                }
                Some(old_job) => {
                    // Re-admission of a still-Pending job: reuse identity and
                    // status, but refresh descriptor/classification fields from
                    // this scan's fresh probe rather than discarding it.
                    let mut refreshed = create_job(candidate.clone(), probe, classification);
                    refreshed.id = old_job.id;
                    refreshed.created_at = old_job.created_at;
                    refreshed.status = old_job.status;
                    refreshed
                }
                None => create_job(candidate.clone(), probe, classification),
            };
            save_job(&job, &config.job_state_dir)?;
            info!(job_id = %job.id, path = %candidate.path.display(), "job admitted");
            Ok(())
        }
    }
}

/// Executor steps 1-10: take one Pending Job to a terminal state.
async fn run_job(job: &mut Job, config: &DaemonConfig) -> Result<()> {
    let path = job.source_path.clone();

    // Step 1: stability gate. The initial sample must be taken now, at the
    // start of the executor, not whatever size the scanner saw when this job
    // was admitted — it may have queued behind other jobs since then.
    let size_at_t0 = match std::fs::metadata(&path) {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            job.reason = Some(format!("source file unreadable before encode: {e}"));
            update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
            write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
            return Ok(());
        }
    };
    let candidate = CandidateFile {
        path: path.clone(),
        size_bytes: size_at_t0,
        modified_time: std::time::SystemTime::now(),
    };
    if !check_stability(&candidate, STABILITY_WAIT).await? {
        job.reason = Some("file still copying".to_string());
        update_job_status(job, JobStatus::Skipped, &config.job_state_dir)?;
        write_why(&path, "file still copying", config)?;
        return Ok(());
    }

    // Step 2: transition to Running.
    update_job_status(job, JobStatus::Running, &config.job_state_dir)?;

    // Step 3: derive temp output path, clear any stale leftover.
    let temp_output = temp_output_path(&path);
    job.output_path = Some(temp_output.clone());
    clear_stale_temp_output(&temp_output)?;
    save_job(job, &config.job_state_dir)?;

    // Need a fresh probe for accurate stream mapping/filters at encode time.
    let probe = match crate::probe::probe_file(&config.ffprobe_bin, &path).await {
        Ok(probe) => probe,
        Err(e) => {
            job.reason = Some(format!("re-probe before encode failed: {e}"));
            update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
            write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
            return Ok(());
        }
    };

    // Step 4: build encoder arguments.
    let args = match build_command(&path, &temp_output, &probe, job.is_web_like) {
        Ok(args) => args,
        Err(e) => {
            job.reason = Some(format!("failed to build encoder arguments: {e}"));
            update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
            write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
            return Ok(());
        }
    };

    job.encoder_used = Some(crate::startup::HARDWARE_ENCODER_CODEC.to_string());
    job.global_quality_used = probe
        .main_video_stream()
        .map(|v| crate::encode::common::global_quality_for_height(v.height));
    job.preset_used = Some("medium".to_string());
    save_job(job, &config.job_state_dir)?;

    // Step 5: invoke encoder.
    if let Err(e) = execute_encode(&config.ffmpeg_bin, job, &args, &config.job_state_dir).await {
        job.reason = Some(e.to_string());
        clear_stale_temp_output(&temp_output)?;
        update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
        write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
        return Ok(());
    }

    // Step 6: measure output size.
    let output_size = match std::fs::metadata(&temp_output) {
        Ok(metadata) => metadata.len(),
        Err(_) => {
            job.reason = Some("encoder exited successfully but produced no output".to_string());
            update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
            write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
            return Ok(());
        }
    };

    // Step 7: size gate.
    let original_bytes = job.original_bytes.unwrap_or(0);
    match check_size_gate(original_bytes, output_size, config.max_size_ratio) {
        SizeGateResult::Pass { .. } => {}
        SizeGateResult::Fail {
            new_bytes,
            threshold_bytes,
        } => {
            let reason = format!(
                "output {new_bytes} bytes exceeds threshold {threshold_bytes} bytes (original {original_bytes} bytes, max_size_ratio {})",
                config.max_size_ratio
            );
            job.reason = Some(reason.clone());
            clear_stale_temp_output(&temp_output)?;
            update_job_status(job, JobStatus::Skipped, &config.job_state_dir)?;
            mark_permanent_skip(&path, &reason)?;
            return Ok(());
        }
    }

    // Step 8: atomic replace — the commit point.
    if let Err(e) = atomic_replace(&path, &temp_output) {
        job.reason = Some(format!("replace failed: {e}"));
        clear_stale_temp_output(&temp_output)?;
        update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
        write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
        return Ok(());
    }

    // Step 9: verify the source path exists post-rename.
    if !path.exists() {
        job.reason = Some("source path missing after replace".to_string());
        update_job_status(job, JobStatus::Failed, &config.job_state_dir)?;
        write_why(&path, job.reason.as_deref().unwrap_or_default(), config)?;
        return Ok(());
    }

    // Step 10: mark Success.
    job.new_bytes = Some(output_size);
    job.reason = None;
    update_job_status(job, JobStatus::Success, &config.job_state_dir)?;
    info!(job_id = %job.id, path = %path.display(), "job completed successfully");

    Ok(())
}

fn write_why(path: &std::path::Path, reason: &str, config: &DaemonConfig) -> Result<()> {
    if config.write_why_sidecars {
        write_why_file(path, reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SourceType;
    use chrono::Utc;
    use std::path::PathBuf;

    fn blank_job(source_path: PathBuf, original_bytes: u64) -> Job {
        Job {
            id: "test-job".to_string(),
            source_path,
            output_path: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            status: JobStatus::Pending,
            reason: None,
            original_bytes: Some(original_bytes),
            new_bytes: None,
            estimated_bytes: None,
            video_codec: None,
            video_bitrate: None,
            video_width: None,
            video_height: None,
            video_frame_rate: None,
            container_name: None,
            audio_track_count: 0,
            subtitle_track_count: 0,
            source_bit_depth: None,
            source_pix_fmt: None,
            is_hdr: None,
            original_duration: None,
            source_class: SourceType::Unknown,
            classification_score: 0.0,
            classification_reasons: vec![],
            is_web_like: true,
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

    #[test]
    fn write_why_respects_config_flag() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        std::fs::write(&video, b"x").unwrap();

        let quiet_config = DaemonConfig {
            write_why_sidecars: false,
            ..Default::default()
        };
        write_why(&video, "not a video", &quiet_config).unwrap();
        assert!(!dir.path().join("movie.mkv.av1qsvd-why.txt").exists());

        let loud_config = DaemonConfig {
            write_why_sidecars: true,
            ..Default::default()
        };
        write_why(&video, "not a video", &loud_config).unwrap();
        assert!(dir.path().join("movie.mkv.av1qsvd-why.txt").exists());
    }

    #[tokio::test]
    async fn pending_jobs_filters_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig {
            job_state_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let mut pending = blank_job(PathBuf::from("/lib/a.mkv"), 1024);
        pending.id = "pending".to_string();
        let mut success = blank_job(PathBuf::from("/lib/b.mkv"), 1024);
        success.id = "success".to_string();
        success.status = JobStatus::Success;

        save_job(&pending, &config.job_state_dir).unwrap();
        save_job(&success, &config.job_state_dir).unwrap();

        let jobs = pending_jobs(&config).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "pending");
    }
}
