use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Expand tilde (~) in a path to the user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if path_str.starts_with("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                let home_path = PathBuf::from(home);
                return home_path.join(&path_str[2..]);
            }
        } else if path_str == "~" {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home);
            }
        }
    }
    path.to_path_buf()
}

/// Mirrors the daemon's configuration schema, so the dashboard reads the
/// same `job_state_dir` the daemon writes to. The dashboard never writes
/// this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    pub library_roots: Vec<PathBuf>,
    pub min_bytes: u64,
    pub max_size_ratio: f64,
    pub job_state_dir: PathBuf,
    #[serde(default = "default_scan_interval_sec")]
    pub scan_interval_sec: u64,
    #[serde(default)]
    pub encoder_install_dir: PathBuf,
    #[serde(default)]
    pub encoder_download_url: String,
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: PathBuf,
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: PathBuf,
    #[serde(default = "default_true")]
    pub write_why_sidecars: bool,
    /// Directory the TUI writes requeue command files to. Not read by the
    /// daemon today; kept for forward compatibility with a future command
    /// channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_dir: Option<PathBuf>,
}

fn default_scan_interval_sec() -> u64 {
    60
}

fn default_ffmpeg_bin() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_bin() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_true() -> bool {
    true
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl TranscodeConfig {
    pub fn default_config() -> Self {
        Self {
            library_roots: vec![PathBuf::from("/media")],
            min_bytes: 2 * 1024 * 1024 * 1024,
            max_size_ratio: 0.90,
            job_state_dir: PathBuf::from("/var/lib/av1qsvd/jobs"),
            scan_interval_sec: 60,
            encoder_install_dir: PathBuf::from("/opt/av1qsvd/encoder"),
            encoder_download_url: String::new(),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            write_why_sidecars: true,
            command_dir: None,
        }
    }

    /// Get the command directory path, deriving from job_state_dir if not explicitly set
    pub fn command_dir(&self) -> PathBuf {
        self.command_dir.clone().unwrap_or_else(|| {
            self.job_state_dir
                .parent()
                .map(|p| p.join("commands"))
                .unwrap_or_else(|| PathBuf::from("/var/lib/av1qsvd/commands"))
        })
    }

    /// Load configuration from a file, or return defaults if path is None or
    /// the file doesn't exist. Accepts both TOML (the daemon's native
    /// format) and JSON.
    pub fn load_config(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default_config();

        if let Some(config_path) = path {
            if config_path.exists() {
                let content = std::fs::read_to_string(config_path)
                    .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

                config = if config_path.extension().and_then(|s| s.to_str()) == Some("toml") {
                    toml::from_str(&content)
                        .with_context(|| format!("failed to parse TOML config: {}", config_path.display()))?
                } else {
                    serde_json::from_str(&content)
                        .with_context(|| format!("failed to parse JSON config: {}", config_path.display()))?
                };
            }
        }

        config.expand_tilde_in_paths();
        Ok(config)
    }

    fn expand_tilde_in_paths(&mut self) {
        self.library_roots = self.library_roots.iter().map(|p| expand_tilde(p)).collect();
        self.job_state_dir = expand_tilde(&self.job_state_dir);
        self.ffmpeg_bin = expand_tilde(&self.ffmpeg_bin);
        self.ffprobe_bin = expand_tilde(&self.ffprobe_bin);
        if let Some(ref cmd_dir) = self.command_dir {
            self.command_dir = Some(expand_tilde(cmd_dir));
        }
    }
}
