use anyhow::{anyhow, Context, Result};
use regex::Regex;
use std::path::Path;
use std::process::Command;

/// Minimum ffmpeg major version this daemon trusts for QSV AV1 encoding.
pub const MIN_FFMPEG_MAJOR_VERSION: u32 = 8;

/// The hardware encoder this daemon drives. A single fixed choice, unlike a
/// software-encoder preference list: the hardware device is the whole point.
pub const HARDWARE_ENCODER_CODEC: &str = "av1_qsv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfmpegVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Parse and validate the ffmpeg binary's reported version. Fatal at startup
/// if the binary can't run or reports a version below the minimum.
pub fn check_ffmpeg_version(ffmpeg_bin: &Path) -> Result<FfmpegVersion> {
    let output = Command::new(ffmpeg_bin)
        .arg("-version")
        .output()
        .with_context(|| format!("failed to execute {} -version", ffmpeg_bin.display()))?;

    if !output.status.success() {
        return Err(anyhow!("{} -version command failed", ffmpeg_bin.display()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_ffmpeg_version(&stdout)
        .ok_or_else(|| anyhow!("failed to parse ffmpeg version from output: {}", stdout))?;

    if version.major < MIN_FFMPEG_MAJOR_VERSION {
        return Err(anyhow!(
            "ffmpeg version {}.{}.{} is too old; version {}.0 or higher is required",
            version.major,
            version.minor,
            version.patch,
            MIN_FFMPEG_MAJOR_VERSION
        ));
    }

    Ok(version)
}

fn parse_ffmpeg_version(output: &str) -> Option<FfmpegVersion> {
    let re = Regex::new(r"ffmpeg version[^\d]*(\d+)\.(\d+)\.(\d+)").unwrap();
    let caps = re.captures(output)?;
    Some(FfmpegVersion {
        major: caps[1].parse().ok()?,
        minor: caps[2].parse().ok()?,
        patch: caps[3].parse().ok()?,
    })
}

/// Confirm the configured ffmpeg binary actually exposes the hardware AV1
/// encoder this daemon requires. Fatal at startup if it doesn't: there is
/// no fallback encoder to degrade to.
pub fn check_hardware_encoder_available(ffmpeg_bin: &Path) -> Result<()> {
    let output = Command::new(ffmpeg_bin)
        .arg("-hide_banner")
        .arg("-encoders")
        .output()
        .with_context(|| format!("failed to execute {} -encoders", ffmpeg_bin.display()))?;

    if !output.status.success() {
        return Err(anyhow!("{} -encoders command failed", ffmpeg_bin.display()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains(HARDWARE_ENCODER_CODEC) {
        return Err(anyhow!(
            "hardware encoder '{}' not exposed by {}; install an ffmpeg build with Intel QSV AV1 support",
            HARDWARE_ENCODER_CODEC,
            ffmpeg_bin.display()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn version_parsing_round_trips_through_the_regex(
            major in 0u32..20,
            minor in 0u32..100,
            patch in 0u32..100,
        ) {
            let version_output = format!(
                "ffmpeg version {}.{}.{} Copyright (c) 2000-2026",
                major, minor, patch
            );

            let parsed = parse_ffmpeg_version(&version_output).unwrap();
            prop_assert_eq!(parsed.major, major);
            prop_assert_eq!(parsed.minor, minor);
            prop_assert_eq!(parsed.patch, patch);
        }
    }

    #[test]
    fn versions_below_minimum_are_rejected_by_the_threshold() {
        let cases = [
            ("ffmpeg version 7.0.0", false),
            ("ffmpeg version 7.9.9", false),
            ("ffmpeg version 8.0.0", true),
            ("ffmpeg version 9.1.0", true),
        ];

        for (raw, should_accept) in cases {
            let version = parse_ffmpeg_version(raw).unwrap();
            assert_eq!(
                version.major >= MIN_FFMPEG_MAJOR_VERSION,
                should_accept,
                "version string {raw} acceptance mismatch"
            );
        }
    }

    #[test]
    fn unparseable_version_output_returns_none() {
        assert!(parse_ffmpeg_version("not an ffmpeg banner at all").is_none());
    }
}
