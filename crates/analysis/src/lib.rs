//! Poise Analysis Core
//!
//! Turns a recorded interview answer into three behavioral signals:
//! - **Emotions:** Distribution of dominant emotions over sampled frames
//! - **Eye contact:** Share of face-bearing sampled frames looking at the camera
//! - **Posture:** Share of face-bearing sampled frames with a neutral head pose
//!
//! # Pipeline
//!
//! ```text
//! video bytes ── FrameSource::open ──► VideoHandle
//!                                          │
//!            Cadence::schedule ────────────┤ (index, run_landmarks, run_emotion)
//!                                          ▼
//!                                     read_frame(i)
//!                          ┌───────────────┴───────────────┐
//!                  LandmarkDetector                EmotionClassifier
//!                          │                               │
//!                    FrameScorer                           │
//!                          └──────────► Aggregator ◄───────┘
//!                                          │
//!                                   AnalysisReport
//! ```
//!
//! Models and decoders are injected through the traits in [`capability`];
//! everything else in this crate is pure computation.

pub mod aggregate;
pub mod capability;
pub mod pipeline;
pub mod schedule;
pub mod scoring;
pub mod track;

pub use aggregate::{Aggregator, SampleCounters};
pub use capability::{EmotionClassifier, Frame, FrameSource, LandmarkDetector, VideoHandle};
pub use pipeline::{AnalysisPhase, AnalysisProgress, Analyzer, ProgressCallback};
pub use schedule::{Cadence, SamplePlan, SampleSchedule, ScheduledFrame};
pub use scoring::{FrameScorer, GeometricScorer};
pub use track::{AnnotationTrack, TrackEmotionClassifier, TrackLandmarkDetector};
