use crate::scan::CandidateFile;
use anyhow::{Context, Result};
use std::fs;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Fixed wait between the two size samples. Inherited policy; see DESIGN.md
/// for why this stays a constant rather than a configuration field.
pub const STABILITY_WAIT: Duration = Duration::from_secs(10);

/// Measure a file's size, wait [`STABILITY_WAIT`], measure again. Stable iff
/// the two samples agree.
pub async fn check_stability(file: &CandidateFile, duration: Duration) -> Result<bool> {
    let initial_size = file.size_bytes;
    debug!(
        path = %file.path.display(),
        initial_size,
        "checking file stability"
    );

    sleep(duration).await;

    let metadata = fs::metadata(&file.path)
        .with_context(|| format!("failed to get metadata for {}", file.path.display()))?;

    let current_size = metadata.len();
    let is_stable = initial_size == current_size;

    if is_stable {
        debug!(path = %file.path.display(), "file is stable");
    } else {
        debug!(
            path = %file.path.display(),
            initial_size,
            current_size,
            "file is unstable"
        );
    }

    Ok(is_stable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    #[tokio::test]
    async fn unchanged_file_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.mkv");
        std::fs::write(&path, vec![0u8; 1024]).unwrap();
        let file = CandidateFile {
            path: path.clone(),
            size_bytes: 1024,
            modified_time: SystemTime::now(),
        };
        let stable = check_stability(&file, Duration::from_millis(5)).await.unwrap();
        assert!(stable);
    }

    #[tokio::test]
    async fn growing_file_is_unstable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movie.mkv");
        std::fs::write(&path, vec![0u8; 1024]).unwrap();
        let file = CandidateFile {
            path: path.clone(),
            size_bytes: 1024,
            modified_time: SystemTime::now(),
        };
        std::fs::write(&path, vec![0u8; 2048]).unwrap();
        let stable = check_stability(&file, Duration::from_millis(1)).await.unwrap();
        assert!(!stable);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let file = CandidateFile {
            path: std::path::PathBuf::from("/nonexistent/path/movie.mkv"),
            size_bytes: 1024,
            modified_time: SystemTime::now(),
        };
        let result = check_stability(&file, Duration::from_millis(1)).await;
        assert!(result.is_err());
    }
}
