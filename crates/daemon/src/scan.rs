use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions the Scanner will ever consider. Anything else is ignored
/// silently, without a sidecar or a log line.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "m4v"];

#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_time: SystemTime,
}

/// Recursively walk every configured library root, returning every file
/// whose extension passes the filter. No other admission test runs here.
pub fn scan_libraries(roots: &[PathBuf]) -> Result<Vec<CandidateFile>> {
    let mut candidates = Vec::new();

    for root in roots {
        debug!(root = %root.display(), "scanning library root");

        if !root.exists() {
            warn!(root = %root.display(), "library root does not exist");
            continue;
        }

        if !root.is_dir() {
            warn!(root = %root.display(), "library root is not a directory");
            continue;
        }

        for entry in WalkDir::new(root).follow_links(false).into_iter().filter_entry(|e| {
            if e.file_type().is_dir() && e.path() != root {
                !e.file_name()
                    .to_str()
                    .map(|s| s.starts_with('.'))
                    .unwrap_or(false)
            } else {
                true
            }
        }) {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !is_video_file(path) {
                        continue;
                    }

                    match fs::metadata(path) {
                        Ok(metadata) => candidates.push(CandidateFile {
                            path: path.to_path_buf(),
                            size_bytes: metadata.len(),
                            modified_time: metadata.modified().unwrap_or_else(|_| SystemTime::now()),
                        }),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "failed to get file metadata");
                            continue;
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "error accessing directory entry");
                    continue;
                }
            }
        }
    }

    debug!(count = candidates.len(), "candidate video files found");
    Ok(candidates)
}

/// Lowercase extension is one of mkv/mp4/m4v.
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_extensions_pass() {
        for ext in ["mkv", "mp4", "m4v", "MKV", "Mp4"] {
            let path = PathBuf::from(format!("movie.{ext}"));
            assert!(is_video_file(&path), "{ext} should be accepted");
        }
    }

    #[test]
    fn rejected_extensions_are_filtered() {
        for ext in ["avi", "ts", "m2ts", "mov", "txt"] {
            let path = PathBuf::from(format!("movie.{ext}"));
            assert!(!is_video_file(&path), "{ext} should be rejected");
        }
    }

    #[test]
    fn scan_finds_only_matching_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mkv"), b"x").unwrap();
        std::fs::write(dir.path().join("b.avi"), b"x").unwrap();
        std::fs::write(dir.path().join("c.mp4"), b"x").unwrap();

        let candidates = scan_libraries(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn hidden_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let hidden = dir.path().join(".hidden");
        std::fs::create_dir(&hidden).unwrap();
        std::fs::write(hidden.join("a.mkv"), b"x").unwrap();

        let candidates = scan_libraries(&[dir.path().to_path_buf()]).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn missing_root_is_skipped_without_error() {
        let candidates = scan_libraries(&[PathBuf::from("/nonexistent/root/path")]).unwrap();
        assert!(candidates.is_empty());
    }
}
