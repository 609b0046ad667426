//! The analysis pipeline.
//!
//! Drives one video through `Opening → Scanning → Finalizing` and ends in
//! `Done` or `Failed`. Only a container that cannot be opened fails a run;
//! undecodable frames, frames without a face, and classifier errors are
//! skipped and show up in [`ScanStats`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use poise_common::error::{PoiseError, PoiseResult};
use poise_model::{AnalysisReport, ScanStats};
use serde::Serialize;

use crate::aggregate::Aggregator;
use crate::capability::{EmotionClassifier, FrameSource, LandmarkDetector, VideoHandle};
use crate::schedule::Cadence;
use crate::scoring::{FrameScorer, GeometricScorer};

/// Stages of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisPhase {
    Opening,
    Scanning,
    Finalizing,
    Done,
    Failed,
}

/// Progress report for an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisProgress {
    pub phase: AnalysisPhase,

    /// Indices visited so far.
    pub indices_visited: u64,

    /// Indices the schedule will visit in total (0 until the media is open).
    pub indices_total: u64,
}

impl AnalysisProgress {
    /// Progress in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        match self.phase {
            AnalysisPhase::Done => 1.0,
            _ if self.indices_total == 0 => 0.0,
            _ => (self.indices_visited as f64 / self.indices_total as f64).clamp(0.0, 1.0),
        }
    }
}

/// Progress callback for analysis runs.
pub type ProgressCallback = Box<dyn Fn(AnalysisProgress) + Send>;

/// Runs the analysis pipeline over injected capabilities.
///
/// An `Analyzer` owns its capability instances; build one per concurrent run.
pub struct Analyzer {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    classifier: Box<dyn EmotionClassifier>,
    scorer: Box<dyn FrameScorer>,
    cadence: Cadence,
    progress: Option<ProgressCallback>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Analyzer {
    /// Create an analyzer with the geometric scorer and default cadence.
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        classifier: Box<dyn EmotionClassifier>,
    ) -> Self {
        Self {
            source,
            detector,
            classifier,
            scorer: Box::new(GeometricScorer),
            cadence: Cadence::default(),
            progress: None,
            cancel: None,
        }
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn FrameScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Stop the run at the next sampled frame once `flag` is set. The
    /// handle is still closed before `analyze` returns.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Analyze one video.
    ///
    /// Fails with `PoiseError::UnreadableMedia` when the container cannot be
    /// opened, or `PoiseError::Cancelled` when the cancel flag was raised
    /// mid-run. The video handle is closed exactly once on every path out of
    /// this call.
    pub fn analyze(&mut self, video: &[u8]) -> PoiseResult<AnalysisReport> {
        tracing::info!(
            bytes = video.len(),
            source = self.source.name(),
            detector = self.detector.name(),
            classifier = self.classifier.name(),
            landmark_stride = self.cadence.landmark_stride(),
            emotion_stride = self.cadence.emotion_stride(),
            "Starting video analysis"
        );

        self.report(AnalysisPhase::Opening, 0, 0);
        let mut video = match self.open(video) {
            Ok(video) => video,
            Err(err) => {
                tracing::warn!(error = %err, "Video analysis failed");
                self.report(AnalysisPhase::Failed, 0, 0);
                return Err(err);
            }
        };

        let (aggregator, mut stats) = match self.scan(&mut video) {
            Ok(scanned) => scanned,
            Err(err) => {
                tracing::warn!(error = %err, "Video analysis abandoned");
                video.close();
                self.report(AnalysisPhase::Failed, 0, 0);
                return Err(err);
            }
        };

        let visited = stats.indices_visited;
        self.report(AnalysisPhase::Finalizing, visited, visited);
        video.close();

        let counters = aggregator.counters();
        stats.frames_with_landmarks = counters.frames_with_landmarks;
        stats.emotion_samples = counters.emotion_samples;
        let result = aggregator.finalize();

        tracing::info!(
            indices = stats.indices_visited,
            frames_with_landmarks = stats.frames_with_landmarks,
            emotion_samples = stats.emotion_samples,
            skipped = stats.skipped_indices(),
            eye_contact = result.eye_contact_ratio,
            posture = result.posture_ratio,
            "Video analysis complete"
        );
        self.report(AnalysisPhase::Done, visited, visited);

        Ok(AnalysisReport { result, stats })
    }

    fn open(&self, video: &[u8]) -> PoiseResult<OpenVideo> {
        let handle = self.source.open(video).map_err(|err| match err {
            PoiseError::UnreadableMedia { .. } => err,
            other => PoiseError::unreadable_media(other.to_string()),
        })?;
        let video = OpenVideo::new(handle);

        let frame_rate_hz = video.handle.frame_rate_hz();
        if !frame_rate_hz.is_finite() || frame_rate_hz <= 0.0 {
            // Dropping `video` closes the handle.
            return Err(PoiseError::unreadable_media(format!(
                "container reports no usable frame rate ({frame_rate_hz})"
            )));
        }

        tracing::debug!(
            frame_count = video.handle.frame_count(),
            frame_rate_hz,
            "Opened video"
        );
        Ok(video)
    }

    fn scan(&mut self, video: &mut OpenVideo) -> PoiseResult<(Aggregator, ScanStats)> {
        let frame_count = video.handle.frame_count();
        let mut stats = ScanStats {
            frame_count,
            frame_rate_hz: video.handle.frame_rate_hz(),
            ..ScanStats::default()
        };
        let mut aggregator = Aggregator::new();
        let total = self.cadence.plan(frame_count).visited_indices;
        self.report(AnalysisPhase::Scanning, 0, total);

        for slot in self.cadence.schedule(frame_count) {
            if self.is_cancelled() {
                return Err(PoiseError::cancelled(stats.indices_visited));
            }
            stats.indices_visited += 1;
            if slot.run_landmarks {
                stats.landmark_indices += 1;
            }
            if slot.run_emotion {
                stats.emotion_indices += 1;
            }

            let frame = match video.handle.read_frame(slot.index) {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::debug!(index = slot.index, "No frame at index; skipping");
                    stats.decode_failures += 1;
                    self.report(AnalysisPhase::Scanning, stats.indices_visited, total);
                    continue;
                }
                Err(err) => {
                    tracing::warn!(index = slot.index, error = %err, "Frame decode failed; skipping");
                    stats.decode_failures += 1;
                    self.report(AnalysisPhase::Scanning, stats.indices_visited, total);
                    continue;
                }
            };
            stats.frames_decoded += 1;

            if slot.run_landmarks {
                match self.detector.detect(&frame) {
                    Some(landmarks) => {
                        let eye = self.scorer.eye_contact(&landmarks);
                        let posture = self.scorer.posture(&landmarks);
                        aggregator.ingest_landmark_frame(eye, posture);
                    }
                    None => {
                        tracing::trace!(index = slot.index, "No face detected");
                        stats.no_face_frames += 1;
                    }
                }
            }

            if slot.run_emotion {
                match self.classifier.classify(&frame) {
                    Ok(label) => aggregator.ingest_emotion_frame(label),
                    Err(err) => {
                        tracing::warn!(
                            index = slot.index,
                            error = %err,
                            "Emotion classification failed; skipping"
                        );
                        stats.classification_failures += 1;
                    }
                }
            }

            self.report(AnalysisPhase::Scanning, stats.indices_visited, total);
        }

        Ok((aggregator, stats))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn report(&self, phase: AnalysisPhase, indices_visited: u64, indices_total: u64) {
        if phase != AnalysisPhase::Scanning {
            tracing::debug!(?phase, "Analysis phase");
        }
        if let Some(cb) = &self.progress {
            cb(AnalysisProgress {
                phase,
                indices_visited,
                indices_total,
            });
        }
    }
}

/// Scoped ownership of an open handle: closes it once, on `close()` or drop.
struct OpenVideo {
    handle: Box<dyn VideoHandle>,
    closed: bool,
}

impl OpenVideo {
    fn new(handle: Box<dyn VideoHandle>) -> Self {
        Self {
            handle,
            closed: false,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.handle.close();
        }
    }
}

impl Drop for OpenVideo {
    fn drop(&mut self) {
        self.close();
    }
}
