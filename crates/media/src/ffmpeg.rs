//! `ffmpeg`-backed [`FrameSource`].

use std::path::PathBuf;
use std::process::Command;

use image::RgbImage;
use poise_analysis::{Frame, FrameSource, VideoHandle};
use poise_common::config::AnalysisDefaults;
use poise_common::error::{PoiseError, PoiseResult};

use crate::probe::{probe_video, VideoInfo};
use crate::staging::StagedVideo;

/// Check whether an executable is on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Decodes containers by shelling out to `ffprobe` and `ffmpeg`.
#[derive(Debug, Clone)]
pub struct FfmpegFrameSource {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    staging_dir: PathBuf,
}

impl Default for FfmpegFrameSource {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegFrameSource {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
            staging_dir: std::env::temp_dir().join("poise"),
        }
    }

    pub fn from_config(defaults: &AnalysisDefaults) -> Self {
        Self::new(defaults.ffmpeg_bin.clone(), defaults.ffprobe_bin.clone())
    }

    /// Directory that receives staged copies of the input bytes.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Stage and probe without decoding, for inspection.
    pub fn probe(&self, video: &[u8]) -> PoiseResult<VideoInfo> {
        let staged = self.stage(video)?;
        probe_video(&self.ffprobe_bin, staged.path())
    }

    fn stage(&self, video: &[u8]) -> PoiseResult<StagedVideo> {
        if video.is_empty() {
            return Err(PoiseError::unreadable_media("video is empty"));
        }
        StagedVideo::write(&self.staging_dir, video)
            .map_err(|e| PoiseError::unreadable_media(format!("failed to stage video: {e}")))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn open(&self, video: &[u8]) -> PoiseResult<Box<dyn VideoHandle>> {
        let staged = self.stage(video)?;
        // On error `staged` drops here and the file is removed.
        let info = probe_video(&self.ffprobe_bin, staged.path())?;

        tracing::info!(
            width = info.width,
            height = info.height,
            frames = info.frame_count,
            fps = info.frame_rate_hz,
            "Opened video"
        );

        Ok(Box::new(FfmpegVideo {
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            staged,
            info,
        }))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// An opened, staged container.
#[derive(Debug)]
pub struct FfmpegVideo {
    ffmpeg_bin: String,
    staged: StagedVideo,
    info: VideoInfo,
}

impl FfmpegVideo {
    /// Timestamp of `index`, assuming a constant frame rate.
    fn seek_secs(&self, index: u64) -> f64 {
        if self.info.frame_rate_hz > 0.0 {
            index as f64 / self.info.frame_rate_hz
        } else {
            0.0
        }
    }
}

impl VideoHandle for FfmpegVideo {
    fn frame_count(&self) -> u64 {
        self.info.frame_count
    }

    fn frame_rate_hz(&self) -> f64 {
        self.info.frame_rate_hz
    }

    fn read_frame(&mut self, index: u64) -> PoiseResult<Option<Frame>> {
        if self.staged.is_released() {
            return Err(PoiseError::frame_decode(index, "video handle is closed"));
        }
        if index >= self.info.frame_count {
            return Ok(None);
        }

        let seek = format!("{:.6}", self.seek_secs(index));
        let output = Command::new(&self.ffmpeg_bin)
            .args(["-v", "error", "-ss", &seek, "-i"])
            .arg(self.staged.path())
            .args([
                "-frames:v", "1", "-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1",
            ])
            .output()
            .map_err(|e| {
                PoiseError::frame_decode(index, format!("failed to run {}: {e}", self.ffmpeg_bin))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PoiseError::frame_decode(
                index,
                decoder_failure_message(output.status, &stderr),
            ));
        }

        decode_rgb_frame(index, &self.info, output.stdout)
    }

    fn close(&mut self) {
        if let Err(e) = self.staged.release() {
            tracing::warn!(
                path = %self.staged.path().display(),
                error = %e,
                "Failed to remove staged video"
            );
        }
    }
}

fn decoder_failure_message(status: std::process::ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("decoder exited with {status}")
    } else {
        format!("decoder exited with {status}: {stderr}")
    }
}

/// Build a frame from raw `rgb24` bytes. Empty output means the seek landed
/// past the last frame.
fn decode_rgb_frame(index: u64, info: &VideoInfo, raw: Vec<u8>) -> PoiseResult<Option<Frame>> {
    if raw.is_empty() {
        return Ok(None);
    }
    let expected = info.rgb_frame_len();
    if raw.len() != expected {
        return Err(PoiseError::frame_decode(
            index,
            format!("expected {expected} bytes of rgb24, got {}", raw.len()),
        ));
    }
    let image = RgbImage::from_raw(info.width, info.height, raw)
        .ok_or_else(|| PoiseError::frame_decode(index, "frame buffer does not match geometry"))?;
    Ok(Some(Frame::new(index, image)))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn info() -> VideoInfo {
        VideoInfo {
            width: 4,
            height: 2,
            frame_count: 10,
            frame_rate_hz: 30.0,
        }
    }

    fn is_empty_dir(dir: &Path) -> bool {
        std::fs::read_dir(dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }

    fn staged_video(dir: &Path, ffmpeg_bin: &str) -> FfmpegVideo {
        FfmpegVideo {
            ffmpeg_bin: ffmpeg_bin.into(),
            staged: StagedVideo::write(dir, b"bytes").unwrap(),
            info: info(),
        }
    }

    #[test]
    fn test_decodes_raw_rgb() {
        let frame = decode_rgb_frame(3, &info(), vec![7; 24]).unwrap().unwrap();
        assert_eq!(frame.index, 3);
        assert_eq!((frame.width(), frame.height()), (4, 2));
        assert_eq!(frame.image.get_pixel(3, 1).0, [7, 7, 7]);
    }

    #[test]
    fn test_empty_output_is_missing_frame() {
        assert!(decode_rgb_frame(9, &info(), Vec::new()).unwrap().is_none());
    }

    #[test]
    fn test_short_output_is_decode_failure() {
        let err = decode_rgb_frame(2, &info(), vec![0; 10]).unwrap_err();
        assert!(matches!(err, PoiseError::FrameDecode { index: 2, .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_empty_bytes_are_unreadable_before_staging() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("staging");
        let source = FfmpegFrameSource::default().with_staging_dir(&dir);
        let err = source.open(&[]).err().unwrap();
        assert!(matches!(err, PoiseError::UnreadableMedia { .. }));
        assert!(!dir.exists());
    }

    #[test]
    fn test_failed_probe_releases_staged_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = FfmpegFrameSource::new("poise-test-no-ffmpeg", "poise-test-no-ffprobe")
            .with_staging_dir(dir.path());
        let err = source.open(b"definitely not a video").err().unwrap();
        assert!(matches!(err, PoiseError::UnreadableMedia { .. }));
        assert!(is_empty_dir(dir.path()));
    }

    #[test]
    fn test_close_removes_staged_file_and_blocks_reads() {
        let dir = tempfile::tempdir().unwrap();
        let mut video = staged_video(dir.path(), "poise-test-no-ffmpeg");
        let path = video.staged.path().to_path_buf();
        assert_eq!(video.frame_count(), 10);
        assert!(video.read_frame(10).unwrap().is_none());

        video.close();
        assert!(!path.exists());
        assert!(matches!(
            video.read_frame(0),
            Err(PoiseError::FrameDecode { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_decoder_is_recoverable_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut video = staged_video(dir.path(), "poise-test-no-ffmpeg");
        let err = video.read_frame(5).unwrap_err();
        assert!(err.is_recoverable());
        drop(video);
        assert!(is_empty_dir(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_decoder_failure_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut video = staged_video(dir.path(), "false");
        let err = video.read_frame(0).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, PoiseError::FrameDecode { index: 0, .. }));
        assert!(message.contains("exit status: 1"), "{message}");
        assert!(!message.ends_with(": "), "{message}");
    }

    #[test]
    fn test_seek_uses_frame_rate() {
        let dir = tempfile::tempdir().unwrap();
        let video = staged_video(dir.path(), "ffmpeg");
        assert!((video.seek_secs(15) - 0.5).abs() < 1e-12);
    }
}
