//! Analyze interview videos.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use poise_analysis::{AnalysisPhase, AnalysisProgress, Analyzer, AnnotationTrack, Cadence};
use poise_common::config::AppConfig;
use poise_media::FfmpegFrameSource;
use poise_model::{AnalysisReport, EmotionLabel, ScanStats, VideoAnalysisResponse};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long a run past its deadline gets to stop and release its staged
/// video before it is abandoned.
pub const CANCEL_GRACE: Duration = Duration::from_secs(5);

pub struct AnalyzeArgs {
    pub videos: Vec<PathBuf>,
    pub annotations: Vec<PathBuf>,
    pub landmark_stride: Option<u64>,
    pub emotion_stride: Option<u64>,
    pub json: bool,
    pub timeout_secs: Option<u64>,
}

/// One entry of the `--json` output.
#[derive(Debug, Serialize)]
struct VideoOutcome {
    video: PathBuf,
    analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    analysis: Option<VideoAnalysisResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dominant_expression: Option<EmotionLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<ScanStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl VideoOutcome {
    fn from_result(video: PathBuf, result: anyhow::Result<AnalysisReport>) -> Self {
        let analyzed_at = Utc::now();
        match result {
            Ok(report) => Self {
                video,
                analyzed_at,
                analysis: Some(VideoAnalysisResponse::from(&report.result)),
                dominant_expression: report.result.emotions.dominant(),
                stats: Some(report.stats),
                error: None,
            },
            Err(e) => Self {
                video,
                analyzed_at,
                analysis: None,
                dominant_expression: None,
                stats: None,
                error: Some(format!("{e:#}")),
            },
        }
    }
}

pub async fn run(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let cadence = Cadence::new(
        args.landmark_stride
            .unwrap_or(config.analysis.landmark_stride),
        args.emotion_stride.unwrap_or(config.analysis.emotion_stride),
    )?;
    let tracks = resolve_annotation_paths(&args.videos, &args.annotations)?;
    let deadline = args
        .timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    // Runs share the deadline, so one flag stops all of them.
    let cancel = Arc::new(AtomicBool::new(false));
    let mut tasks = Vec::with_capacity(args.videos.len());
    for (video, annotations) in args.videos.iter().cloned().zip(tracks) {
        let source = FfmpegFrameSource::from_config(&config.analysis);
        let path = video.clone();
        let flag = Arc::clone(&cancel);
        let handle = tokio::task::spawn_blocking(move || {
            analyze_video(source, cadence, &path, &annotations, flag)
        });
        tasks.push((video, handle));
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (video, handle) in tasks {
        let result = join_with_deadline(handle, deadline, &cancel).await;
        if let Err(e) = &result {
            tracing::warn!(video = %video.display(), error = %e, "Analysis failed");
        }
        outcomes.push(VideoOutcome::from_result(video, result));
    }

    if args.json {
        let json = match outcomes.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            all => serde_json::to_string_pretty(all)?,
        };
        println!("{json}");
    } else {
        for outcome in &outcomes {
            print_summary(outcome);
        }
    }

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} videos could not be analyzed", outcomes.len());
    }
    Ok(())
}

fn analyze_video(
    source: FfmpegFrameSource,
    cadence: Cadence,
    video: &Path,
    annotations: &Path,
    cancel: Arc<AtomicBool>,
) -> anyhow::Result<AnalysisReport> {
    let track = AnnotationTrack::load(annotations)
        .map_err(|e| anyhow::anyhow!("Failed to load annotations {}: {e}", annotations.display()))?;
    let bytes = std::fs::read(video)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", video.display()))?;

    let (detector, classifier) = track.capabilities();
    let name = video.display().to_string();
    let mut analyzer = Analyzer::new(Box::new(source), Box::new(detector), Box::new(classifier))
        .with_cadence(cadence)
        .with_cancel_flag(cancel)
        .with_progress(Box::new(move |progress: AnalysisProgress| {
            if progress.phase == AnalysisPhase::Scanning {
                tracing::trace!(video = %name, visited = progress.indices_visited, total = progress.indices_total, "Scanning");
            } else {
                tracing::debug!(video = %name, phase = ?progress.phase, "Analysis phase");
            }
        }));

    Ok(analyzer.analyze(&bytes)?)
}

/// Wait for a run until `deadline`. Past the deadline the run is told to
/// stop and given [`CANCEL_GRACE`] to wind down.
async fn join_with_deadline<T>(
    mut handle: JoinHandle<anyhow::Result<T>>,
    deadline: Option<Instant>,
    cancel: &AtomicBool,
) -> anyhow::Result<T> {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                if tokio::time::timeout(CANCEL_GRACE, &mut handle).await.is_err() {
                    tracing::warn!("Run did not stop within the grace period; abandoning it");
                }
                anyhow::bail!("analysis timed out");
            }
        },
        None => handle.await,
    };
    joined.unwrap_or_else(|e| Err(anyhow::anyhow!("analysis task failed: {e}")))
}

/// Pair each video with its annotation track: one shared track, one per
/// video, or the `<video>.annotations.jsonl` sibling when none is given.
fn resolve_annotation_paths(
    videos: &[PathBuf],
    annotations: &[PathBuf],
) -> anyhow::Result<Vec<PathBuf>> {
    match annotations.len() {
        0 => Ok(videos
            .iter()
            .map(|video| video.with_extension("annotations.jsonl"))
            .collect()),
        1 => Ok(vec![annotations[0].clone(); videos.len()]),
        n if n == videos.len() => Ok(annotations.to_vec()),
        n => anyhow::bail!(
            "got {n} annotation tracks for {} videos; pass one shared track or one per video",
            videos.len()
        ),
    }
}

fn print_summary(outcome: &VideoOutcome) {
    println!("Video: {}", outcome.video.display());

    let (Some(analysis), Some(stats)) = (&outcome.analysis, &outcome.stats) else {
        println!(
            "  Failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        );
        println!();
        return;
    };

    println!("  Eye contact: {:.1}%", analysis.eye_contact * 100.0);
    println!("  Posture: {:.1}%", analysis.posture_score * 100.0);

    match outcome.dominant_expression {
        Some(label) => {
            let share = analysis
                .facial_expressions
                .get(label.as_str())
                .copied()
                .unwrap_or(0.0);
            println!("  Dominant expression: {label} ({:.1}%)", share * 100.0);
        }
        None => println!("  Dominant expression: none (no emotion samples)"),
    }
    for label in EmotionLabel::ALL {
        let share = analysis
            .facial_expressions
            .get(label.as_str())
            .copied()
            .unwrap_or(0.0);
        println!("    {:<9} {:>5.1}%", label.as_str(), share * 100.0);
    }

    println!(
        "  Frames: {} @ {:.2}fps ({:.1}s)",
        stats.frame_count,
        stats.frame_rate_hz,
        stats.duration_secs()
    );
    println!(
        "  Sampled: {} frames, {} with a face, {} emotion samples, {} skipped",
        stats.indices_visited,
        stats.frames_with_landmarks,
        stats.emotion_samples,
        stats.skipped_indices()
    );
    println!();
}
