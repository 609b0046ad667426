//! Poise Data Model
//!
//! Defines the core data contracts for interview video analysis:
//! - **Emotions:** The closed set of dominant-emotion labels and distributions over them
//! - **Landmarks:** Facial landmark sets produced by a face-mesh detector
//! - **Results:** The aggregate behavioral signals produced by one analysis run
//! - **Annotations:** Per-frame annotation tracks for offline capability replay
//!
//! Landmark coordinates are normalized to `[0.0, 1.0]` relative to the
//! frame dimensions, the convention face-mesh models emit.

pub mod annotation;
pub mod emotion;
pub mod landmarks;
pub mod result;

pub use annotation::*;
pub use emotion::*;
pub use landmarks::*;
pub use result::*;
