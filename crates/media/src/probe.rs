//! Stream metadata via `ffprobe`.

use std::path::Path;
use std::process::Command;

use poise_common::error::{PoiseError, PoiseResult};
use serde::Deserialize;

/// Geometry and timing of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u64,
    pub frame_rate_hz: f64,
}

impl VideoInfo {
    /// Bytes in one decoded `rgb24` frame.
    pub fn rgb_frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate_hz > 0.0 {
            self.frame_count as f64 / self.frame_rate_hz
        } else {
            0.0
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    nb_read_packets: Option<String>,
}

/// Probe `path` with the given `ffprobe` binary.
///
/// Any failure (missing binary, unrecognized container, no video stream,
/// zero-sized frames) is reported as `UnreadableMedia`.
pub fn probe_video(ffprobe_bin: &str, path: &Path) -> PoiseResult<VideoInfo> {
    let output = Command::new(ffprobe_bin)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_packets",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate,nb_frames,nb_read_packets",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| PoiseError::unreadable_media(format!("failed to run {ffprobe_bin}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PoiseError::unreadable_media(format!(
            "{ffprobe_bin} rejected the container: {}",
            stderr.trim()
        )));
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&raw)?;
    tracing::debug!(
        width = info.width,
        height = info.height,
        frames = info.frame_count,
        fps = info.frame_rate_hz,
        "Probed video stream"
    );
    Ok(info)
}

/// Parse the JSON `ffprobe` prints for the `-show_entries` query above.
pub fn parse_probe_output(raw: &str) -> PoiseResult<VideoInfo> {
    let parsed: ProbeOutput = serde_json::from_str(raw)
        .map_err(|e| PoiseError::unreadable_media(format!("malformed probe output: {e}")))?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| PoiseError::unreadable_media("no video stream"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(PoiseError::unreadable_media("video stream has no frame size")),
    };

    // avg_frame_rate reflects the real cadence for variable-rate streams;
    // r_frame_rate is the fallback when the muxer leaves it as 0/0.
    let frame_rate_hz = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rational))
        .unwrap_or(0.0);

    // nb_frames is absent for some containers (Matroska, raw streams).
    let frame_count = stream
        .nb_frames
        .as_deref()
        .and_then(parse_count)
        .or_else(|| stream.nb_read_packets.as_deref().and_then(parse_count))
        .unwrap_or(0);

    Ok(VideoInfo {
        width,
        height,
        frame_count,
        frame_rate_hz,
    })
}

/// Parse an ffprobe rational such as `30000/1001` or a plain decimal.
/// Returns `None` for zero, negative, or non-finite rates.
pub fn parse_rational(value: &str) -> Option<f64> {
    let value = value.trim();
    let rate = match value.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => value.parse::<f64>().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

fn parse_count(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}
