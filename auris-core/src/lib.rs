//! # auris-core
//!
//! Reusable speech-activity detection SDK.
//!
//! ## Architecture
//!
//! ```text
//! sample buffer → Windower → Window Scan Loop → ordered probabilities
//!                                 │                     │
//!                        WindowScorer::score       Segmenter FSM
//!                                 │                     │
//!                        StateTracker::update     speech segments
//! ```
//!
//! Scoring is strictly sequential: every window's probability depends on the
//! recurrent state produced by the previous window, so one scan can never be
//! parallelised internally. Run independent `DetectorSession`s on separate
//! threads instead; each session owns its state outright.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod buffering;
pub mod detector;
pub mod error;
pub mod scoring;
pub mod segmenter;
pub mod state;

// Convenience re-exports for downstream crates
pub use buffering::chunk::AudioChunk;
pub use detector::{
    DetectionMode, DetectorSession, ScoredWindow, DEFAULT_WINDOW_SAMPLES, SAMPLE_RATE,
};
pub use error::{DetectError, FormatError, ScoreError};
pub use scoring::{Scored, WindowScorer};
pub use segmenter::{Segment, SegmentConfig};
pub use state::{RecurrentState, StateTracker};

#[cfg(feature = "onnx")]
pub use scoring::SileroScorer;
