//! Window scoring abstraction.
//!
//! The `WindowScorer` trait decouples the detection pipeline from any
//! specific backend: the Silero ONNX model, a deterministic stub, or any
//! future neural scorer.
//!
//! `&mut self` on `score` intentionally expresses that backends are
//! stateful — ONNX sessions reuse internal buffers between runs. The
//! recurrent memory itself is NOT backend state: it is passed in and handed
//! back as an owned `RecurrentState`, so the detection session, not the
//! backend, owns the temporal context.

pub mod stub;

#[cfg(feature = "onnx")]
pub mod silero;

#[cfg(feature = "onnx")]
pub use silero::SileroScorer;

use crate::error::ScoreError;
use crate::state::RecurrentState;

/// One window's scoring result.
#[derive(Debug, Clone)]
pub struct Scored {
    /// Speech probability in [0.0, 1.0].
    pub probability: f32,
    /// Updated recurrent state; must replace the session's previous state
    /// before the next window is scored.
    pub state: RecurrentState,
}

/// Contract for speech-probability backends.
pub trait WindowScorer: Send + 'static {
    /// Score one fixed-size window of mono f32 samples.
    ///
    /// # Errors
    /// Fails when the backend cannot produce output (malformed input,
    /// backend fault). Callers must treat any failure as fatal for the scan
    /// in progress: the state handed in here was consumed, and no updated
    /// state came back.
    fn score(
        &mut self,
        window: &[f32],
        sample_rate: u32,
        state: RecurrentState,
    ) -> Result<Scored, ScoreError>;
}
