//! Per-frame annotation tracks.
//!
//! An annotation track records what a face-mesh detector and an emotion
//! classifier reported for individual frames of a video, one JSON object per
//! line. Lines starting with `#` are headers and are skipped. Tracks let a
//! run be replayed offline without the models present.
//!
//! ```text
//! # {"source":"face_mesh+emotion"}
//! {"frame":0,"landmarks":[[0.5,0.5,0.0], ...],"emotion":"happy"}
//! {"frame":5,"landmarks":[[0.5,0.5,0.0], ...]}
//! {"frame":30,"emotion_error":"no face for classifier"}
//! ```

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionLabel;
use crate::landmarks::LandmarkSet;

/// Detector and classifier output recorded for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotation {
    /// Absolute frame index.
    pub frame: u64,

    /// Landmarks of the detected face; absent when no face was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmarks: Option<LandmarkSet>,

    /// Dominant emotion; absent when the frame was not classified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionLabel>,

    /// Error the classifier raised on this frame, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_error: Option<String>,
}

impl FrameAnnotation {
    pub fn new(frame: u64) -> Self {
        Self {
            frame,
            landmarks: None,
            emotion: None,
            emotion_error: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: LandmarkSet) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn with_emotion(mut self, emotion: EmotionLabel) -> Self {
        self.emotion = Some(emotion);
        self
    }
}

/// Parse annotations from JSONL content (one JSON object per line).
pub fn parse_annotations(jsonl: &str) -> Result<Vec<FrameAnnotation>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize annotations to JSONL format.
pub fn serialize_annotations(annotations: &[FrameAnnotation]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for annotation in annotations {
        output.push_str(&serde_json::to_string(annotation)?);
        output.push('\n');
    }
    Ok(output)
}
