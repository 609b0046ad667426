//! Capabilities replayed from a recorded annotation track.
//!
//! Lets a run use detector and classifier output captured ahead of time
//! (for instance by a face-mesh service) instead of live models. Frames are
//! looked up by absolute index.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use poise_common::error::{PoiseError, PoiseResult};
use poise_model::annotation::{parse_annotations, FrameAnnotation};
use poise_model::{EmotionLabel, LandmarkSet};

use crate::capability::{EmotionClassifier, Frame, LandmarkDetector};

/// Annotations keyed by frame index.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTrack {
    frames: HashMap<u64, FrameAnnotation>,
}

impl AnnotationTrack {
    /// Build a track. A later annotation for the same frame replaces an earlier one.
    pub fn new(annotations: Vec<FrameAnnotation>) -> Self {
        Self {
            frames: annotations.into_iter().map(|a| (a.frame, a)).collect(),
        }
    }

    /// Parse a JSONL annotation track.
    pub fn parse(jsonl: &str) -> PoiseResult<Self> {
        let annotations = parse_annotations(jsonl)
            .map_err(|e| PoiseError::annotation(format!("invalid annotation line: {e}")))?;
        Ok(Self::new(annotations))
    }

    /// Load a JSONL annotation track from disk.
    pub fn load(path: &Path) -> PoiseResult<Self> {
        if !path.exists() {
            return Err(PoiseError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let track = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), frames = track.len(), "Loaded annotation track");
        Ok(track)
    }

    pub fn get(&self, frame: u64) -> Option<&FrameAnnotation> {
        self.frames.get(&frame)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Detector and classifier sharing this track.
    pub fn capabilities(self) -> (TrackLandmarkDetector, TrackEmotionClassifier) {
        let track = Arc::new(self);
        (
            TrackLandmarkDetector {
                track: Arc::clone(&track),
            },
            TrackEmotionClassifier { track },
        )
    }
}

/// Landmark detector answering from an annotation track.
#[derive(Debug, Clone)]
pub struct TrackLandmarkDetector {
    track: Arc<AnnotationTrack>,
}

impl LandmarkDetector for TrackLandmarkDetector {
    fn detect(&mut self, frame: &Frame) -> Option<LandmarkSet> {
        self.track
            .get(frame.index)
            .and_then(|annotation| annotation.landmarks.clone())
            .filter(|landmarks| !landmarks.is_empty())
    }

    fn name(&self) -> &str {
        "annotation-track"
    }
}

/// Emotion classifier answering from an annotation track.
#[derive(Debug, Clone)]
pub struct TrackEmotionClassifier {
    track: Arc<AnnotationTrack>,
}

impl EmotionClassifier for TrackEmotionClassifier {
    fn classify(&mut self, frame: &Frame) -> PoiseResult<EmotionLabel> {
        let annotation = self
            .track
            .get(frame.index)
            .ok_or_else(|| PoiseError::classification(frame.index, "frame not in annotation track"))?;

        if let Some(message) = &annotation.emotion_error {
            return Err(PoiseError::classification(frame.index, message.clone()));
        }
        annotation
            .emotion
            .ok_or_else(|| PoiseError::classification(frame.index, "no emotion recorded for frame"))
    }

    fn name(&self) -> &str {
        "annotation-track"
    }
}
