use crate::classify::{classify_source, SourceClassification};
use crate::config::DaemonConfig;
use crate::jobs::{Job, JobStatus};
use crate::probe::{probe_file, ProbeResult};
use crate::scan::CandidateFile;
use crate::sidecars::{create_skip_marker, has_skip_marker, write_classification_file, write_why_file};

/// Outcome of running a candidate through the ordered admission pipeline
/// (scan steps 2 through 8). Step 1, the extension filter, happens in the
/// Scanner before a file ever reaches here; step 9 (admit/reuse the Job) is
/// the caller's responsibility once it holds an `Admitted` outcome.
#[derive(Debug)]
pub enum AdmissionOutcome {
    /// A Job for this path already reached Success; nothing to do.
    AlreadySucceeded,
    /// The file was rejected; `permanent` means a `.av1qsvd-skip` marker was
    /// also written so future scans stop looking at it.
    Rejected { reason: String, permanent: bool },
    Admitted {
        probe: ProbeResult,
        classification: SourceClassification,
    },
}

/// Evaluate one candidate file against steps 2-8 of the admission pipeline,
/// writing sidecars for any rejection along the way.
pub async fn evaluate_admission(
    file: &CandidateFile,
    existing_job: Option<&Job>,
    config: &DaemonConfig,
) -> anyhow::Result<AdmissionOutcome> {
    // Step 2: permanent skip marker.
    if has_skip_marker(&file.path) {
        write_why(&file.path, "marked with .av1qsvd-skip", config)?;
        return Ok(AdmissionOutcome::Rejected {
            reason: "marked with .av1qsvd-skip".to_string(),
            permanent: true,
        });
    }

    // Step 3: prior Success is the only permanent decision.
    if let Some(job) = existing_job {
        if job.status == JobStatus::Success {
            return Ok(AdmissionOutcome::AlreadySucceeded);
        }
    }

    // Step 4: size floor.
    if file.size_bytes <= config.min_bytes {
        let reason = format!(
            "file size {} bytes is at or below the minimum of {} bytes",
            file.size_bytes, config.min_bytes
        );
        write_why(&file.path, &reason, config)?;
        return Ok(AdmissionOutcome::Rejected {
            reason,
            permanent: false,
        });
    }

    // Step 5: probe.
    let probe = match probe_file(&config.ffprobe_bin, &file.path).await {
        Ok(probe) => probe,
        Err(e) => {
            let reason = e.to_string();
            write_why(&file.path, &reason, config)?;
            return Ok(AdmissionOutcome::Rejected {
                reason,
                permanent: false,
            });
        }
    };

    // Step 6: video presence.
    if !probe.has_video() {
        write_why(&file.path, "not a video", config)?;
        return Ok(AdmissionOutcome::Rejected {
            reason: "not a video".to_string(),
            permanent: false,
        });
    }

    // Step 7: already AV1.
    if probe.has_av1() {
        write_why(&file.path, "already av1", config)?;
        return Ok(AdmissionOutcome::Rejected {
            reason: "already av1".to_string(),
            permanent: false,
        });
    }

    // Step 8: classify.
    let classification = classify_source(&file.path, &probe);
    write_classification_file(&file.path, &classification)?;

    Ok(AdmissionOutcome::Admitted {
        probe,
        classification,
    })
}

/// Permanently mark a file so future scans skip it outright, writing an
/// explanatory sidecar alongside the marker.
pub fn mark_permanent_skip(path: &std::path::Path, reason: &str) -> anyhow::Result<()> {
    create_skip_marker(path)?;
    write_why_file(path, reason)?;
    Ok(())
}

fn write_why(path: &std::path::Path, reason: &str, config: &DaemonConfig) -> anyhow::Result<()> {
    if config.write_why_sidecars {
        write_why_file(path, reason)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::SystemTime;

    fn config_with_root(dir: &std::path::Path) -> DaemonConfig {
        DaemonConfig {
            library_roots: vec![dir.to_path_buf()],
            min_bytes: 1_000,
            ..Default::default()
        }
    }

    fn candidate(path: PathBuf, size: u64) -> CandidateFile {
        CandidateFile {
            path,
            size_bytes: size,
            modified_time: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn skip_marker_rejects_permanently() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        std::fs::write(&video, vec![0u8; 2_000]).unwrap();
        create_skip_marker(&video).unwrap();

        let config = config_with_root(dir.path());
        let outcome = evaluate_admission(&candidate(video, 2_000), None, &config)
            .await
            .unwrap();

        match outcome {
            AdmissionOutcome::Rejected { permanent, .. } => assert!(permanent),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn prior_success_short_circuits() {
        use crate::classify::SourceType;
        use chrono::Utc;

        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        std::fs::write(&video, vec![0u8; 2_000]).unwrap();

        let job = Job {
            id: "job-1".to_string(),
            source_path: video.clone(),
            output_path: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: Some(Utc::now()),
            status: JobStatus::Success,
            reason: None,
            original_bytes: Some(2_000),
            new_bytes: Some(1_000),
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
        };

        let config = config_with_root(dir.path());
        let outcome = evaluate_admission(&candidate(video, 2_000), Some(&job), &config)
            .await
            .unwrap();

        assert!(matches!(outcome, AdmissionOutcome::AlreadySucceeded));
    }

    #[tokio::test]
    async fn size_floor_rejects_small_files() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mkv");
        std::fs::write(&video, vec![0u8; 500]).unwrap();

        let config = config_with_root(dir.path());
        let outcome = evaluate_admission(&candidate(video, 500), None, &config)
            .await
            .unwrap();

        match outcome {
            AdmissionOutcome::Rejected { permanent, reason } => {
                assert!(!permanent);
                assert!(reason.contains("minimum"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
