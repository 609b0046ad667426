//! Poise Media
//!
//! Frame source backed by the `ffprobe`/`ffmpeg` command-line tools.
//! Video bytes are staged to a temporary file for the lifetime of a handle,
//! probed once for stream geometry and frame count, and decoded one frame
//! at a time to RGB.

pub mod ffmpeg;
pub mod probe;
pub mod staging;

pub use ffmpeg::{command_exists, FfmpegFrameSource, FfmpegVideo};
pub use probe::{probe_video, VideoInfo};
pub use staging::StagedVideo;
