//! Accumulation of per-frame results into the final signals.

use poise_model::{AnalysisResult, EmotionDistribution, EmotionLabel};

use crate::scoring::{EYE_CONTACT_THRESHOLD, GOOD_POSTURE_THRESHOLD};

/// Running counters for one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleCounters {
    /// Occurrences per label, indexed by [`EmotionLabel::index`].
    pub emotion_counts: [u64; EmotionLabel::COUNT],
    pub eye_contact_hits: u64,
    pub good_posture_hits: u64,
    /// Denominator for the eye-contact and posture ratios.
    pub frames_with_landmarks: u64,
    /// Denominator for the emotion distribution.
    pub emotion_samples: u64,
}

impl SampleCounters {
    pub fn count(&self, label: EmotionLabel) -> u64 {
        self.emotion_counts[label.index()]
    }
}

/// Owns the counters of one run. [`Aggregator::finalize`] consumes it.
#[derive(Debug, Default)]
pub struct Aggregator {
    counters: SampleCounters,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the scores of a frame in which a face was found.
    pub fn ingest_landmark_frame(&mut self, eye_contact_score: f64, posture_score: f64) {
        self.counters.frames_with_landmarks += 1;
        if eye_contact_score > EYE_CONTACT_THRESHOLD {
            self.counters.eye_contact_hits += 1;
        }
        if posture_score > GOOD_POSTURE_THRESHOLD {
            self.counters.good_posture_hits += 1;
        }
    }

    /// Record the dominant emotion of a classified frame.
    pub fn ingest_emotion_frame(&mut self, label: EmotionLabel) {
        self.counters.emotion_samples += 1;
        self.counters.emotion_counts[label.index()] += 1;
    }

    pub fn counters(&self) -> &SampleCounters {
        &self.counters
    }

    /// Convert the counters into the final signals. Zero denominators give
    /// zero ratios and an all-zero distribution.
    pub fn finalize(self) -> AnalysisResult {
        let c = &self.counters;
        AnalysisResult {
            emotions: EmotionDistribution::from_counts(&c.emotion_counts),
            eye_contact_ratio: ratio(c.eye_contact_hits, c.frames_with_landmarks),
            posture_ratio: ratio(c.good_posture_hits, c.frames_with_landmarks),
        }
    }
}

fn ratio(hits: u64, samples: u64) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    hits as f64 / samples as f64
}
