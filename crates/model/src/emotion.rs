//! Emotion labels and distributions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Dominant emotion reported by an emotion classifier for one frame.
///
/// The set is closed: classifiers that emit other labels must map them
/// onto one of these before handing them to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl EmotionLabel {
    /// Number of labels in the closed set.
    pub const COUNT: usize = 7;

    /// Every label, in canonical order.
    pub const ALL: [EmotionLabel; Self::COUNT] = [
        EmotionLabel::Angry,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Surprise,
        EmotionLabel::Neutral,
    ];

    /// Position of this label in [`EmotionLabel::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Angry => "angry",
            Self::Disgust => "disgust",
            Self::Fear => "fear",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Surprise => "surprise",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the seven labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion label: {0:?}")]
pub struct UnknownEmotion(pub String);

impl FromStr for EmotionLabel {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == lowered)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Share of emotion samples per label.
///
/// Always carries all seven labels. Shares sum to 1.0 when at least one
/// sample was recorded, otherwise every share is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EmotionDistribution(BTreeMap<EmotionLabel, f64>);

/// Labels absent from the input deserialize with a zero share.
impl<'de> Deserialize<'de> for EmotionDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let shares = BTreeMap::<EmotionLabel, f64>::deserialize(deserializer)?;
        let mut distribution = Self::zeroed();
        distribution.0.extend(shares);
        Ok(distribution)
    }
}

impl EmotionDistribution {
    /// A distribution with every share at zero.
    pub fn zeroed() -> Self {
        Self(EmotionLabel::ALL.into_iter().map(|l| (l, 0.0)).collect())
    }

    /// Normalize raw per-label counts (indexed by [`EmotionLabel::index`]).
    pub fn from_counts(counts: &[u64; EmotionLabel::COUNT]) -> Self {
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return Self::zeroed();
        }
        Self(
            EmotionLabel::ALL
                .into_iter()
                .map(|label| (label, counts[label.index()] as f64 / total as f64))
                .collect(),
        )
    }

    /// Share for a single label.
    pub fn share(&self, label: EmotionLabel) -> f64 {
        self.0.get(&label).copied().unwrap_or(0.0)
    }

    /// Sum of all shares: 1.0 (within rounding) or 0.0.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|share| *share == 0.0)
    }

    /// Label with the largest share. Ties resolve to the earlier label in
    /// canonical order; `None` when no samples were recorded.
    pub fn dominant(&self) -> Option<EmotionLabel> {
        let mut best: Option<(EmotionLabel, f64)> = None;
        for (label, share) in self.iter() {
            if share <= 0.0 {
                continue;
            }
            match best {
                Some((_, best_share)) if best_share >= share => {}
                _ => best = Some((label, share)),
            }
        }
        best.map(|(label, _)| label)
    }

    /// Iterate `(label, share)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        self.0.iter().map(|(label, share)| (*label, *share))
    }
}

impl Default for EmotionDistribution {
    fn default() -> Self {
        Self::zeroed()
    }
}
