/// Metadata validation and formatting utilities for the TUI
///
/// This module provides helper functions for:
/// - Validating job metadata completeness
/// - Formatting optional values consistently
/// - Identifying missing metadata fields
use crate::models::Job;
use std::fmt::Display;

/// Check if job has all metadata needed for savings estimation
///
/// Required fields for estimation:
/// - original_bytes: Size of the original file
/// - video_codec: Source codec (affects compression potential)
/// - video_width: Video width in pixels
/// - video_height: Video height in pixels
/// - video_bitrate: Source bitrate
/// - video_frame_rate: Frame rate for duration calculations
pub fn has_estimation_metadata(job: &Job) -> bool {
    job.original_bytes.is_some()
        && job.video_codec.is_some()
        && job.video_width.is_some()
        && job.video_height.is_some()
        && job.video_bitrate.is_some()
        && job.video_frame_rate.is_some()
}

/// Check if job has complete video metadata
///
/// Complete metadata includes all estimation fields plus:
/// - source_bit_depth: Bit depth of source video
/// - source_pix_fmt: Pixel format
/// - is_hdr: HDR status
pub fn has_complete_video_metadata(job: &Job) -> bool {
    has_estimation_metadata(job)
        && job.source_bit_depth.is_some()
        && job.source_pix_fmt.is_some()
        && job.is_hdr.is_some()
}

/// Get list of missing metadata fields for a job
///
/// Returns a vector of field names that are missing and required for estimation.
/// Field abbreviations:
/// - "orig": original_bytes
/// - "codec": video_codec
/// - "w": video_width
/// - "h": video_height
/// - "br": video_bitrate
/// - "fps": video_frame_rate
pub fn get_missing_metadata_fields(job: &Job) -> Vec<&'static str> {
    let mut missing = Vec::new();

    if job.original_bytes.is_none() {
        missing.push("orig");
    }
    if job.video_codec.is_none() {
        missing.push("codec");
    }
    if job.video_width.is_none() {
        missing.push("w");
    }
    if job.video_height.is_none() {
        missing.push("h");
    }
    if job.video_bitrate.is_none() {
        missing.push("br");
    }
    if job.video_frame_rate.is_none() {
        missing.push("fps");
    }

    missing
}

/// Format optional value with fallback
///
/// Returns the formatted value if Some, otherwise returns the fallback string.
///
/// # Examples
/// ```
/// let value: Option<i32> = Some(42);
/// assert_eq!(format_optional(value, "-"), "42");
///
/// let value: Option<i32> = None;
/// assert_eq!(format_optional(value, "-"), "-");
/// ```
pub fn format_optional<T: Display>(value: Option<T>, fallback: &str) -> String {
    match value {
        Some(v) => v.to_string(),
        None => fallback.to_string(),
    }
}

/// Format file size with fallback
///
/// Returns human-readable size if Some, otherwise returns the fallback string.
/// Uses decimal units (GB, MB, KB) for consistency with storage industry standards.
pub fn format_size_optional(bytes: Option<u64>, fallback: &str) -> String {
    match bytes {
        Some(b) => {
            use humansize::{format_size, DECIMAL};
            format_size(b, DECIMAL)
        }
        None => fallback.to_string(),
    }
}

/// Format percentage with fallback
///
/// Returns formatted percentage (e.g., "45.2%") if Some, otherwise returns fallback.
/// Clamps percentage to 0-100 range for display.
pub fn format_percentage_optional(value: Option<f64>, fallback: &str) -> String {
    match value {
        Some(pct) => {
            let clamped = pct.max(0.0).min(100.0);
            format!("{:.1}%", clamped)
        }
        None => fallback.to_string(),
    }
}

/// Format missing metadata indicator
///
/// Creates a string showing which specific fields are missing.
/// Format: "-field1,field2,field3"
///
/// # Examples
/// ```
/// let missing = vec!["orig", "codec", "w"];
/// assert_eq!(format_missing_metadata(&missing), "-orig,codec,w");
///
/// let missing = vec![];
/// assert_eq!(format_missing_metadata(&missing), "");
/// ```
pub fn format_missing_metadata(missing_fields: &[&str]) -> String {
    if missing_fields.is_empty() {
        String::new()
    } else {
        format!("-{}", missing_fields.join(","))
    }
}

/// Format codec name consistently (uppercase)
///
/// Returns uppercase codec name if Some, otherwise returns fallback.
/// Ensures consistent display of codec names across the UI.
pub fn format_codec(codec: Option<&str>, fallback: &str) -> String {
    match codec {
        Some(c) => c.to_uppercase(),
        None => fallback.to_string(),
    }
}
