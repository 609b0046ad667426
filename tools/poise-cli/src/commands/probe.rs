//! Probe a video and show the sampling plan.

use std::path::PathBuf;

use poise_analysis::Cadence;
use poise_common::config::AppConfig;
use poise_media::FfmpegFrameSource;

pub fn run(config: &AppConfig, video: PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(&video)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", video.display()))?;

    let source = FfmpegFrameSource::from_config(&config.analysis);
    let info = source
        .probe(&bytes)
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", video.display()))?;

    let cadence = Cadence::new(
        config.analysis.landmark_stride,
        config.analysis.emotion_stride,
    )?;
    let plan = cadence.plan(info.frame_count);

    println!("Video: {}", video.display());
    println!("  Resolution: {}x{}", info.width, info.height);
    println!(
        "  Frames: {} @ {:.3}fps ({:.1}s)",
        info.frame_count,
        info.frame_rate_hz,
        info.duration_secs()
    );
    println!();
    println!("Sampling plan:");
    println!(
        "  Landmarks: every {} frames ({} samples)",
        cadence.landmark_stride(),
        plan.landmark_indices
    );
    println!(
        "  Emotion: every {} frames ({} samples)",
        cadence.emotion_stride(),
        plan.emotion_indices
    );
    println!("  Frames decoded: {}", plan.visited_indices);

    Ok(())
}
