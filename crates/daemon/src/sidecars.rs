use crate::classify::SourceClassification;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Permanent skip marker. Presence means the Scanner must ignore the file forever.
pub fn create_skip_marker(video_path: &Path) -> Result<()> {
    let path = skip_marker_path(video_path);
    fs::write(&path, "")
        .with_context(|| format!("failed to create skip marker at {}", path.display()))?;
    Ok(())
}

pub fn has_skip_marker(video_path: &Path) -> bool {
    skip_marker_path(video_path).is_file()
}

/// Human-readable reason for the last skip/reject. Gated by `write_why_sidecars`.
pub fn write_why_file(video_path: &Path, reason: &str) -> Result<()> {
    let path = why_file_path(video_path);
    fs::write(&path, reason)
        .with_context(|| format!("failed to write why file at {}", path.display()))?;
    Ok(())
}

/// Classifier class, score, and reasons. Always written regardless of
/// `write_why_sidecars`.
pub fn write_classification_file(video_path: &Path, classification: &SourceClassification) -> Result<()> {
    let path = classification_file_path(video_path);
    let mut contents = format!(
        "class: {:?}\nscore: {:.2}\n",
        classification.source_type, classification.score
    );
    for reason in &classification.reasons {
        contents.push_str("- ");
        contents.push_str(reason);
        contents.push('\n');
    }
    fs::write(&path, contents)
        .with_context(|| format!("failed to write classification file at {}", path.display()))?;
    Ok(())
}

/// Operator override forcing WebLike classification.
pub fn has_websafe_override(video_path: &Path) -> bool {
    sibling_path(video_path, "websafe").is_file()
}

/// Operator override forcing DiscLike classification.
pub fn has_nowebsafe_override(video_path: &Path) -> bool {
    sibling_path(video_path, "nowebsafe").is_file()
}

fn skip_marker_path(video_path: &Path) -> PathBuf {
    sibling_path(video_path, "av1qsvd-skip")
}

fn why_file_path(video_path: &Path) -> PathBuf {
    sibling_path(video_path, "av1qsvd-why.txt")
}

fn classification_file_path(video_path: &Path) -> PathBuf {
    sibling_path(video_path, "av1qsvd-classification.txt")
}

fn sibling_path(video_path: &Path, suffix: &str) -> PathBuf {
    let mut name = video_path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    video_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SourceType;

    #[test]
    fn skip_marker_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        std::fs::write(&video, b"x").unwrap();
        assert!(!has_skip_marker(&video));
        create_skip_marker(&video).unwrap();
        assert!(has_skip_marker(&video));
        assert!(dir.path().join("movie.mkv.av1qsvd-skip").is_file());
    }

    #[test]
    fn why_file_contains_reason() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        write_why_file(&video, "file still copying").unwrap();
        let contents = std::fs::read_to_string(dir.path().join("movie.mkv.av1qsvd-why.txt")).unwrap();
        assert_eq!(contents, "file still copying");
    }

    #[test]
    fn classification_file_lists_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        let classification = SourceClassification {
            source_type: SourceType::WebLike,
            score: 5.5,
            reasons: vec!["filename contains web token 'web-dl'".to_string()],
        };
        write_classification_file(&video, &classification).unwrap();
        let contents =
            std::fs::read_to_string(dir.path().join("movie.mkv.av1qsvd-classification.txt")).unwrap();
        assert!(contents.contains("WebLike"));
        assert!(contents.contains("5.50"));
        assert!(contents.contains("web-dl"));
    }

    #[test]
    fn override_sidecars_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("movie.mkv");
        assert!(!has_websafe_override(&video));
        std::fs::write(dir.path().join("movie.mkv.websafe"), b"").unwrap();
        assert!(has_websafe_override(&video));
        assert!(!has_nowebsafe_override(&video));
    }
}
