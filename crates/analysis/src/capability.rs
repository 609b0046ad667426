//! Capabilities the pipeline consumes.
//!
//! Decoders and models are passed into [`crate::Analyzer`] as explicitly
//! constructed instances. Each run owns its instances, so concurrent runs
//! share nothing.

use image::RgbImage;
use poise_common::error::PoiseResult;
use poise_model::{EmotionLabel, LandmarkSet};

/// A decoded video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Absolute frame index within the container.
    pub index: u64,

    /// Decoded pixels.
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Opens raw video bytes into a decodable handle.
pub trait FrameSource: Send {
    /// Open a container. Fails with `PoiseError::UnreadableMedia` when the
    /// bytes cannot be opened; any resource acquired along the way is
    /// released before returning the error.
    fn open(&self, video: &[u8]) -> PoiseResult<Box<dyn VideoHandle>>;

    /// Source name, for logs.
    fn name(&self) -> &str;
}

/// An opened container.
pub trait VideoHandle: Send {
    /// Total frames in the container.
    fn frame_count(&self) -> u64;

    /// Nominal frame rate.
    fn frame_rate_hz(&self) -> f64;

    /// Decode the frame at an absolute index.
    ///
    /// `Ok(None)` means the container holds no frame at that index;
    /// `Err(PoiseError::FrameDecode)` means the frame exists but failed to decode.
    fn read_frame(&mut self, index: u64) -> PoiseResult<Option<Frame>>;

    /// Release the decoder and any staged data. Called exactly once per handle.
    fn close(&mut self);
}

/// Face-mesh landmark detector.
pub trait LandmarkDetector: Send {
    /// Landmarks for the single most prominent face, or `None` when no face
    /// is found. Finding no face is a normal outcome, not an error.
    fn detect(&mut self, frame: &Frame) -> Option<LandmarkSet>;

    fn name(&self) -> &str;
}

/// Dominant-emotion classifier.
pub trait EmotionClassifier: Send {
    /// Dominant emotion in the frame. May fail with
    /// `PoiseError::Classification`; the pipeline skips the frame.
    fn classify(&mut self, frame: &Frame) -> PoiseResult<EmotionLabel>;

    fn name(&self) -> &str;
}
