use super::common::{
    global_quality_for_height, stream_mapping_flags, surface_format, video_filter_chain,
    websafe_input_flags, websafe_output_flags,
};
use crate::probe::ProbeResult;
use crate::startup::HARDWARE_ENCODER_CODEC;
use anyhow::{Context, Result};
use std::path::Path;

/// Build the ffmpeg argument list for one Intel QSV AV1 encode. Does not
/// include the ffmpeg binary itself — the caller prepends that.
pub fn build_qsv_command(
    input: &Path,
    output: &Path,
    probe: &ProbeResult,
    is_web_like: bool,
) -> Result<Vec<String>> {
    let main_video = probe
        .main_video_stream()
        .context("cannot build encoder arguments without a video stream")?;

    let surface = surface_format(main_video.bit_depth);
    let quality = global_quality_for_height(main_video.height);

    let mut args: Vec<String> = Vec::new();

    args.push("-hide_banner".to_string());
    args.push("-analyzeduration".to_string());
    args.push("50M".to_string());
    args.push("-probesize".to_string());
    args.push("50M".to_string());
    args.push("-init_hw_device".to_string());
    args.push("qsv=hw".to_string());
    args.push("-filter_hw_device".to_string());
    args.push("hw".to_string());

    if is_web_like {
        args.extend(websafe_input_flags());
    }

    args.push("-i".to_string());
    args.push(input.to_string_lossy().into_owned());

    args.extend(stream_mapping_flags(probe));

    if is_web_like {
        args.extend(websafe_output_flags());
    }

    args.push("-vf:v:0".to_string());
    args.push(video_filter_chain(surface));

    args.push("-c:v:0".to_string());
    args.push(HARDWARE_ENCODER_CODEC.to_string());
    args.push("-global_quality:v:0".to_string());
    args.push(quality.to_string());
    args.push("-preset:v:0".to_string());
    args.push("medium".to_string());
    args.push("-look_ahead".to_string());
    args.push("1".to_string());

    args.push("-c:a".to_string());
    args.push("copy".to_string());
    args.push("-c:s".to_string());
    args.push("copy".to_string());

    args.push("-max_muxing_queue_size".to_string());
    args.push("2048".to_string());
    args.push("-map_metadata".to_string());
    args.push("0".to_string());

    args.push("-f".to_string());
    args.push("matroska".to_string());
    args.push("-movflags".to_string());
    args.push("+faststart".to_string());

    args.push(output.to_string_lossy().into_owned());

    Ok(args)
}

/// The temporary output path for one job: `<basename>.av1-tmp.mkv` beside
/// the source.
pub fn temp_output_path(input: &Path) -> std::path::PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    parent.join(format!("{stem}.av1-tmp.mkv"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{FormatInfo, VideoStream};
    use std::path::PathBuf;

    fn probe_with_video(height: i32, bit_depth: Option<u8>) -> ProbeResult {
        ProbeResult {
            format: FormatInfo::default(),
            video_streams: vec![VideoStream {
                index: 0,
                codec_name: "h264".to_string(),
                width: 1920,
                height,
                bitrate: None,
                frame_rate: None,
                avg_frame_rate: None,
                pix_fmt: None,
                bit_depth,
                is_default: true,
            }],
            audio_streams: vec![],
            subtitle_streams: vec![],
        }
    }

    #[test]
    fn web_like_sources_get_timestamp_flags() {
        let probe = probe_with_video(1080, Some(8));
        let args = build_qsv_command(
            Path::new("/lib/movie.mp4"),
            Path::new("/lib/movie.av1-tmp.mkv"),
            &probe,
            true,
        )
        .unwrap();
        assert!(args.contains(&"-start_at_zero".to_string()));
        assert!(args.contains(&"make_zero".to_string()));
    }

    #[test]
    fn disc_like_sources_skip_timestamp_flags() {
        let probe = probe_with_video(1080, Some(8));
        let args = build_qsv_command(
            Path::new("/lib/movie.mkv"),
            Path::new("/lib/movie.av1-tmp.mkv"),
            &probe,
            false,
        )
        .unwrap();
        assert!(!args.contains(&"-start_at_zero".to_string()));
    }

    #[test]
    fn quality_constant_follows_height_tier() {
        let probe_4k = probe_with_video(2160, Some(10));
        let args = build_qsv_command(
            Path::new("/lib/movie.mkv"),
            Path::new("/lib/movie.av1-tmp.mkv"),
            &probe_4k,
            false,
        )
        .unwrap();
        let idx = args.iter().position(|a| a == "-global_quality:v:0").unwrap();
        assert_eq!(args[idx + 1], "23");
    }

    #[test]
    fn ten_bit_source_uses_p010_surface() {
        let probe = probe_with_video(1080, Some(10));
        let args = build_qsv_command(
            Path::new("/lib/movie.mkv"),
            Path::new("/lib/movie.av1-tmp.mkv"),
            &probe,
            false,
        )
        .unwrap();
        assert!(args.iter().any(|a| a.contains("format=p010")));
    }

    #[test]
    fn missing_video_stream_fails_construction() {
        let probe = ProbeResult {
            format: FormatInfo::default(),
            video_streams: vec![],
            audio_streams: vec![],
            subtitle_streams: vec![],
        };
        let result = build_qsv_command(
            Path::new("/lib/movie.mkv"),
            Path::new("/lib/movie.av1-tmp.mkv"),
            &probe,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn temp_output_path_uses_basename_with_mkv_extension() {
        let path = temp_output_path(&PathBuf::from("/media/movies/example.mp4"));
        assert_eq!(path, PathBuf::from("/media/movies/example.av1-tmp.mkv"));
    }
}
