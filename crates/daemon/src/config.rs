use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub library_roots: Vec<PathBuf>,
    pub min_bytes: u64,
    pub max_size_ratio: f64,
    pub job_state_dir: PathBuf,
    pub scan_interval_sec: u64,
    pub encoder_install_dir: PathBuf,
    pub encoder_download_url: String,
    pub ffmpeg_bin: PathBuf,
    pub ffprobe_bin: PathBuf,
    pub write_why_sidecars: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            library_roots: vec![PathBuf::from("/media")],
            min_bytes: 2_147_483_648, // 2 GiB
            max_size_ratio: 0.90,
            job_state_dir: PathBuf::from("/var/lib/av1qsvd/jobs"),
            scan_interval_sec: 60,
            encoder_install_dir: PathBuf::from("/opt/av1qsvd/encoder"),
            encoder_download_url: String::new(),
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            ffprobe_bin: PathBuf::from("ffprobe"),
            write_why_sidecars: true,
        }
    }
}

pub fn load_config(path: Option<&std::path::Path>) -> Result<DaemonConfig> {
    let config = if let Some(config_path) = path {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("failed to read config file: {}", e))?;

            toml::from_str::<DaemonConfig>(&contents)
                .map_err(|e| anyhow::anyhow!("failed to parse TOML config: {}", e))?
        } else {
            #[cfg(not(test))]
            tracing::warn!(path = %config_path.display(), "config file not found, using defaults");
            DaemonConfig::default()
        }
    } else {
        #[cfg(not(test))]
        tracing::info!("no config path provided, using defaults");
        DaemonConfig::default()
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &DaemonConfig) -> Result<()> {
    // An empty library_roots is valid: the daemon idles, scanning nothing,
    // until the config is updated.
    if config.max_size_ratio <= 0.0 || config.max_size_ratio > 1.0 {
        anyhow::bail!("max_size_ratio must be between 0.0 and 1.0 (exclusive of 0.0)");
    }

    if config.min_bytes == 0 {
        anyhow::bail!("min_bytes must be greater than zero");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn arb_daemon_config() -> impl Strategy<Value = DaemonConfig> {
        (
            prop::collection::vec(any::<String>().prop_map(PathBuf::from), 1..5),
            1_000_000_u64..100_000_000_000_u64,
            0.01_f64..1.0_f64,
            any::<String>().prop_map(PathBuf::from),
            1_u64..3600_u64,
            any::<String>().prop_map(PathBuf::from),
            any::<String>(),
            any::<String>().prop_map(PathBuf::from),
            any::<String>().prop_map(PathBuf::from),
            any::<bool>(),
        )
            .prop_map(
                |(
                    library_roots,
                    min_bytes,
                    max_size_ratio,
                    job_state_dir,
                    scan_interval_sec,
                    encoder_install_dir,
                    encoder_download_url,
                    ffmpeg_bin,
                    ffprobe_bin,
                    write_why_sidecars,
                )| {
                    DaemonConfig {
                        library_roots,
                        min_bytes,
                        max_size_ratio,
                        job_state_dir,
                        scan_interval_sec,
                        encoder_install_dir,
                        encoder_download_url,
                        ffmpeg_bin,
                        ffprobe_bin,
                        write_why_sidecars,
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For any valid DaemonConfig, serializing to TOML and then deserializing
        /// should produce an equivalent configuration.
        #[test]
        fn prop_config_round_trip(config in arb_daemon_config()) {
            let toml_string = toml::to_string(&config)
                .expect("failed to serialize config to TOML");

            let mut temp_file = NamedTempFile::new()
                .expect("failed to create temp file");
            temp_file.write_all(toml_string.as_bytes())
                .expect("failed to write to temp file");
            temp_file.flush()
                .expect("failed to flush temp file");

            let loaded_config = load_config(Some(temp_file.path()))
                .expect("failed to load config from file");

            prop_assert_eq!(config, loaded_config);
        }
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let non_existent_path = PathBuf::from("/tmp/non_existent_config_12345.toml");
        let config = load_config(Some(&non_existent_path)).expect("should load defaults");
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_no_config_path_uses_defaults() {
        let config = load_config(None).expect("should load defaults");
        assert_eq!(config, DaemonConfig::default());
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let mut temp_file = NamedTempFile::new().expect("failed to create temp file");
        temp_file
            .write_all(b"this is not valid TOML {{{")
            .expect("failed to write");
        temp_file.flush().expect("failed to flush");

        let result = load_config(Some(temp_file.path()));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("parse TOML"));
    }

    #[test]
    fn test_partial_config_with_defaults() {
        let mut temp_file = NamedTempFile::new().expect("failed to create temp file");
        let partial_toml = r#"
library_roots = ["/custom/path"]
min_bytes = 5000000000
"#;
        temp_file
            .write_all(partial_toml.as_bytes())
            .expect("failed to write");
        temp_file.flush().expect("failed to flush");

        let config = load_config(Some(temp_file.path())).expect("should load partial config");

        assert_eq!(config.library_roots, vec![PathBuf::from("/custom/path")]);
        assert_eq!(config.min_bytes, 5_000_000_000);

        assert_eq!(
            config.max_size_ratio,
            DaemonConfig::default().max_size_ratio
        );
        assert_eq!(
            config.scan_interval_sec,
            DaemonConfig::default().scan_interval_sec
        );
        assert_eq!(config.ffmpeg_bin, DaemonConfig::default().ffmpeg_bin);
    }

    #[test]
    fn test_validation_empty_library_roots_is_accepted() {
        let config = DaemonConfig {
            library_roots: vec![],
            ..Default::default()
        };

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_invalid_max_size_ratio_zero() {
        let config = DaemonConfig {
            max_size_ratio: 0.0,
            ..Default::default()
        };

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_size_ratio"));
    }

    #[test]
    fn test_validation_invalid_max_size_ratio_above_one() {
        let config = DaemonConfig {
            max_size_ratio: 1.5,
            ..Default::default()
        };

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("max_size_ratio"));
    }

    #[test]
    fn test_validation_zero_min_bytes() {
        let config = DaemonConfig {
            min_bytes: 0,
            ..Default::default()
        };

        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("min_bytes"));
    }
}
