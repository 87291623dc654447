use crate::probe::ProbeResult;

/// Stream mapping per the executor's argument-construction contract: include
/// everything, drop all video and all attachments, re-add the main video
/// stream by its index among video streams, then explicitly drop Russian
/// audio/subtitle tracks. Chapters and container metadata are preserved.
pub fn stream_mapping_flags(probe: &ProbeResult) -> Vec<String> {
    let main_video_index = probe
        .video_streams
        .iter()
        .position(|v| Some(v.index) == probe.main_video_stream().map(|m| m.index))
        .unwrap_or(0);

    vec![
        "-map".to_string(),
        "0".to_string(),
        "-map".to_string(),
        "-0:v".to_string(),
        "-map".to_string(),
        "-0:t".to_string(),
        "-map".to_string(),
        format!("0:v:{main_video_index}"),
        "-map".to_string(),
        "0:a?".to_string(),
        "-map".to_string(),
        "-0:a:m:language:rus".to_string(),
        "-map".to_string(),
        "-0:a:m:language:ru".to_string(),
        "-map".to_string(),
        "0:s?".to_string(),
        "-map".to_string(),
        "-0:s:m:language:rus".to_string(),
        "-map".to_string(),
        "-0:s:m:language:ru".to_string(),
        "-map_chapters".to_string(),
        "0".to_string(),
        "-map_metadata".to_string(),
        "0".to_string(),
    ]
}

/// Extra input/output flags applied only when the source is treated as
/// web-like: timestamp regeneration at input, zero vsync and clamped
/// negative timestamps at output.
pub fn websafe_input_flags() -> Vec<String> {
    vec![
        "-fflags".to_string(),
        "+genpts".to_string(),
        "-copyts".to_string(),
        "-start_at_zero".to_string(),
    ]
}

pub fn websafe_output_flags() -> Vec<String> {
    vec![
        "-vsync".to_string(),
        "0".to_string(),
        "-avoid_negative_ts".to_string(),
        "make_zero".to_string(),
    ]
}

/// Surface pixel format for the hardware upload filter: 10-bit sources keep
/// their extra precision, everything else downsamples to nv12.
pub fn surface_format(source_bit_depth: Option<u8>) -> &'static str {
    if source_bit_depth.unwrap_or(8) >= 10 {
        "p010"
    } else {
        "nv12"
    }
}

/// Global quality constant by source height. Fixed policy, not tuned per file.
pub fn global_quality_for_height(height: i32) -> u8 {
    if height >= 1440 {
        23
    } else if height >= 1080 {
        24
    } else {
        25
    }
}

/// Pad to even dimensions, square pixel aspect ratio, coerce surface format,
/// hand off to the hardware uploader.
pub fn video_filter_chain(surface: &str) -> String {
    format!("pad=ceil(iw/2)*2:ceil(ih/2)*2,setsar=1,format={surface},hwupload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{AudioStream, FormatInfo, SubtitleStream, VideoStream};

    fn sample_probe() -> ProbeResult {
        ProbeResult {
            format: FormatInfo::default(),
            video_streams: vec![
                VideoStream {
                    index: 0,
                    codec_name: "h264".to_string(),
                    width: 1920,
                    height: 1080,
                    bitrate: None,
                    frame_rate: None,
                    avg_frame_rate: None,
                    pix_fmt: None,
                    bit_depth: Some(8),
                    is_default: false,
                },
                VideoStream {
                    index: 3,
                    codec_name: "h264".to_string(),
                    width: 1920,
                    height: 1080,
                    bitrate: None,
                    frame_rate: None,
                    avg_frame_rate: None,
                    pix_fmt: None,
                    bit_depth: Some(8),
                    is_default: true,
                },
            ],
            audio_streams: vec![AudioStream {
                index: 1,
                codec_name: "aac".to_string(),
                language: None,
            }],
            subtitle_streams: vec![SubtitleStream {
                index: 2,
                codec_name: "subrip".to_string(),
                language: None,
            }],
        }
    }

    #[test]
    fn maps_the_default_disposition_stream_by_relative_index() {
        let flags = stream_mapping_flags(&sample_probe());
        assert!(flags.contains(&"0:v:1".to_string()));
    }

    #[test]
    fn surface_format_follows_bit_depth() {
        assert_eq!(surface_format(Some(10)), "p010");
        assert_eq!(surface_format(Some(8)), "nv12");
        assert_eq!(surface_format(None), "nv12");
    }

    #[test]
    fn global_quality_tiers_by_height() {
        assert_eq!(global_quality_for_height(2160), 23);
        assert_eq!(global_quality_for_height(1440), 23);
        assert_eq!(global_quality_for_height(1080), 24);
        assert_eq!(global_quality_for_height(720), 25);
    }
}
