//! Frame sampling schedule.
//!
//! Two cadences run against absolute frame indices: a landmark cadence for
//! cheap geometric scoring and a sparser emotion cadence for classifier
//! inference. An index is visited once if either cadence selects it.

use poise_common::error::{PoiseError, PoiseResult};

/// The pair of sampling strides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    landmark_stride: u64,
    emotion_stride: u64,
}

impl Cadence {
    pub const DEFAULT_LANDMARK_STRIDE: u64 = 5;
    pub const DEFAULT_EMOTION_STRIDE: u64 = 30;

    /// Create a cadence. Both strides must be at least 1.
    pub fn new(landmark_stride: u64, emotion_stride: u64) -> PoiseResult<Self> {
        if landmark_stride == 0 || emotion_stride == 0 {
            return Err(PoiseError::config(format!(
                "sampling strides must be positive (landmark={landmark_stride}, emotion={emotion_stride})"
            )));
        }
        Ok(Self {
            landmark_stride,
            emotion_stride,
        })
    }

    pub fn landmark_stride(&self) -> u64 {
        self.landmark_stride
    }

    pub fn emotion_stride(&self) -> u64 {
        self.emotion_stride
    }

    pub fn runs_landmarks(&self, index: u64) -> bool {
        index % self.landmark_stride == 0
    }

    pub fn runs_emotion(&self, index: u64) -> bool {
        index % self.emotion_stride == 0
    }

    /// Smallest index `>= from` selected by either cadence.
    fn next_selected(&self, from: u64) -> Option<u64> {
        let landmark = next_multiple(from, self.landmark_stride);
        let emotion = next_multiple(from, self.emotion_stride);
        match (landmark, emotion) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Indices to visit for a video of `frame_count` frames.
    pub fn schedule(&self, frame_count: u64) -> SampleSchedule {
        SampleSchedule {
            cadence: *self,
            frame_count,
            next: 0,
        }
    }

    /// How many indices each cadence selects, and how many distinct indices
    /// are visited, for `frame_count` frames.
    pub fn plan(&self, frame_count: u64) -> SamplePlan {
        let landmark = multiples_below(frame_count, self.landmark_stride);
        let emotion = multiples_below(frame_count, self.emotion_stride);
        let both = match lcm(self.landmark_stride, self.emotion_stride) {
            Some(common) => multiples_below(frame_count, common),
            // Only index 0 can be a common multiple below frame_count.
            None => u64::from(frame_count > 0),
        };
        SamplePlan {
            landmark_indices: landmark,
            emotion_indices: emotion,
            visited_indices: landmark + emotion - both,
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            landmark_stride: Self::DEFAULT_LANDMARK_STRIDE,
            emotion_stride: Self::DEFAULT_EMOTION_STRIDE,
        }
    }
}

/// Index counts a schedule will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePlan {
    pub landmark_indices: u64,
    pub emotion_indices: u64,
    pub visited_indices: u64,
}

/// One visited index and the analyses that run on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledFrame {
    pub index: u64,
    pub run_landmarks: bool,
    pub run_emotion: bool,
}

/// Iterator over the indices of one video, in increasing order.
#[derive(Debug, Clone)]
pub struct SampleSchedule {
    cadence: Cadence,
    frame_count: u64,
    next: u64,
}

impl Iterator for SampleSchedule {
    type Item = ScheduledFrame;

    fn next(&mut self) -> Option<ScheduledFrame> {
        if self.next >= self.frame_count {
            return None;
        }
        let index = match self.cadence.next_selected(self.next) {
            Some(index) if index < self.frame_count => index,
            _ => {
                self.next = self.frame_count;
                return None;
            }
        };
        // index < frame_count <= u64::MAX, so index + 1 cannot overflow.
        self.next = index + 1;

        Some(ScheduledFrame {
            index,
            run_landmarks: self.cadence.runs_landmarks(index),
            run_emotion: self.cadence.runs_emotion(index),
        })
    }
}

fn next_multiple(from: u64, stride: u64) -> Option<u64> {
    match from % stride {
        0 => Some(from),
        rem => from.checked_add(stride - rem),
    }
}

fn multiples_below(frame_count: u64, stride: u64) -> u64 {
    if frame_count == 0 {
        return 0;
    }
    (frame_count - 1) / stride + 1
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}
