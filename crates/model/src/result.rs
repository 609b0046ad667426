//! Aggregate analysis results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::emotion::EmotionDistribution;

/// The three behavioral signals produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Share of emotion samples per dominant-emotion label.
    pub emotions: EmotionDistribution,

    /// Fraction of face-bearing sampled frames with good eye contact, in `[0.0, 1.0]`.
    pub eye_contact_ratio: f64,

    /// Fraction of face-bearing sampled frames with good posture, in `[0.0, 1.0]`.
    pub posture_ratio: f64,
}

impl AnalysisResult {
    /// The result of a run that found nothing usable.
    pub fn zeroed() -> Self {
        Self {
            emotions: EmotionDistribution::zeroed(),
            eye_contact_ratio: 0.0,
            posture_ratio: 0.0,
        }
    }
}

/// What happened to the sampled frames during a run.
///
/// Skipped frames reduce the sample counts behind the ratios; they never
/// fail the run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanStats {
    /// Total frames reported by the container.
    pub frame_count: u64,
    /// Container frame rate.
    pub frame_rate_hz: f64,
    /// Distinct indices visited (union of both cadences).
    pub indices_visited: u64,
    /// Indices selected by the landmark cadence.
    pub landmark_indices: u64,
    /// Indices selected by the emotion cadence.
    pub emotion_indices: u64,
    /// Frames successfully decoded.
    pub frames_decoded: u64,
    /// Indices skipped because the frame failed to decode.
    pub decode_failures: u64,
    /// Landmark-cadence frames in which no face was found.
    pub no_face_frames: u64,
    /// Emotion-cadence frames on which classification failed.
    pub classification_failures: u64,
    /// Denominator of the eye-contact and posture ratios.
    pub frames_with_landmarks: u64,
    /// Denominator of the emotion distribution.
    pub emotion_samples: u64,
}

impl ScanStats {
    /// Approximate media duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.frame_rate_hz <= 0.0 {
            return 0.0;
        }
        self.frame_count as f64 / self.frame_rate_hz
    }

    /// Indices that produced no usable signal of any kind.
    pub fn skipped_indices(&self) -> u64 {
        self.decode_failures + self.no_face_frames + self.classification_failures
    }
}

/// A completed run: the signals plus the sampling statistics behind them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub stats: ScanStats,
}

/// JSON body returned to HTTP clients of the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysisResponse {
    pub facial_expressions: BTreeMap<String, f64>,
    pub eye_contact: f64,
    pub posture_score: f64,
}

impl From<&AnalysisResult> for VideoAnalysisResponse {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            facial_expressions: result
                .emotions
                .iter()
                .map(|(label, share)| (label.as_str().to_string(), share))
                .collect(),
            eye_contact: result.eye_contact_ratio,
            posture_score: result.posture_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::EmotionLabel;

    #[test]
    fn test_response_matches_endpoint_shape() {
        let mut counts = [0; EmotionLabel::COUNT];
        counts[EmotionLabel::Happy.index()] = 5;
        let result = AnalysisResult {
            emotions: EmotionDistribution::from_counts(&counts),
            eye_contact_ratio: 0.8,
            posture_ratio: 0.5,
        };

        let response = VideoAnalysisResponse::from(&result);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["eye_contact"], 0.8);
        assert_eq!(json["posture_score"], 0.5);
        assert_eq!(json["facial_expressions"]["happy"], 1.0);
        assert_eq!(json["facial_expressions"]["fear"], 0.0);
        assert_eq!(json["facial_expressions"].as_object().unwrap().len(), 7);
    }

    #[test]
    fn test_duration_handles_missing_frame_rate() {
        let stats = ScanStats {
            frame_count: 150,
            frame_rate_hz: 30.0,
            ..Default::default()
        };
        assert!((stats.duration_secs() - 5.0).abs() < 1e-12);
        assert_eq!(ScanStats::default().duration_secs(), 0.0);
    }
}
