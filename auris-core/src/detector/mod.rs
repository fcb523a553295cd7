//! Detection sessions, the public entry point of the crate.
//!
//! A `DetectorSession` owns one scorer plus the recurrent state threaded
//! through consecutive windows. Sessions are cheap to create; give every
//! concurrent audio source its own and never share one across threads. The
//! state is order-dependent, so interleaved calls from two sources would
//! corrupt both probability sequences.

pub mod scan;

use serde::{Deserialize, Serialize};

use crate::buffering::chunk::AudioChunk;
use crate::error::{FormatError, Result};
use crate::scoring::WindowScorer;
use crate::segmenter::{self, Segment, SegmentConfig};
use crate::state::StateTracker;

/// The only sample rate accepted at the detection boundary.
pub const SAMPLE_RATE: u32 = 16_000;

/// Default scoring window: 512 samples at 16 kHz = 32 ms.
pub const DEFAULT_WINDOW_SAMPLES: usize = 512;

/// Recurrent-state handling across consecutive detection calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Every call is independent; state is zeroed before scoring.
    Chunk,
    /// State carries over between calls while the window size is unchanged,
    /// for continuous processing of a live feed.
    Stream { window_samples: usize },
}

/// One window's speech probability with the sample range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredWindow {
    /// Speech probability in [0.0, 1.0].
    pub probability: f32,
    /// First sample index of the window.
    pub start: usize,
    /// Last sample index covered (inclusive). Zero-padding added to a short
    /// final window is not counted.
    pub end: usize,
}

/// A stateful detection session.
pub struct DetectorSession {
    scorer: Box<dyn WindowScorer>,
    tracker: StateTracker,
    mode: DetectionMode,
}

impl DetectorSession {
    pub fn new(scorer: impl WindowScorer) -> Self {
        Self {
            scorer: Box::new(scorer),
            tracker: StateTracker::new(),
            mode: DetectionMode::Chunk,
        }
    }

    /// Score every window of `chunk` as one independent pass.
    ///
    /// Recurrent state is zeroed first, so identical chunks always produce
    /// identical probability sequences.
    pub fn detect_chunks(
        &mut self,
        chunk: &AudioChunk,
        window_samples: usize,
    ) -> Result<Vec<ScoredWindow>> {
        self.check_input(chunk, window_samples)?;
        self.tracker.reset();
        self.mode = DetectionMode::Chunk;
        self.scan(chunk, window_samples)
    }

    /// Score every window of `chunk`, carrying recurrent state over from the
    /// previous streaming call.
    ///
    /// State survives between calls only while `window_samples` is unchanged
    /// and the previous call was also a streaming call; otherwise it is
    /// zeroed first.
    pub fn detect_streaming(
        &mut self,
        chunk: &AudioChunk,
        window_samples: usize,
    ) -> Result<Vec<ScoredWindow>> {
        self.check_input(chunk, window_samples)?;
        if self.mode != (DetectionMode::Stream { window_samples }) {
            self.tracker.reset();
            self.mode = DetectionMode::Stream { window_samples };
        }
        self.scan(chunk, window_samples)
    }

    /// Score `chunk` as one independent pass, then consolidate the window
    /// probabilities into padded speech segments.
    pub fn detect_segments(
        &mut self,
        chunk: &AudioChunk,
        config: &SegmentConfig,
    ) -> Result<Vec<Segment>> {
        let scores = self.detect_chunks(chunk, config.window_samples)?;
        Ok(segmenter::segment_scores(
            &scores,
            chunk.len(),
            SAMPLE_RATE,
            config,
        ))
    }

    /// Zero the recurrent state and fall back to chunk mode.
    ///
    /// Required after any failed detection call before the session is
    /// reused; state correctness is not guaranteed once a scan aborts.
    pub fn reset_state(&mut self) {
        self.tracker.reset();
        self.mode = DetectionMode::Chunk;
    }

    /// Current detection mode.
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    fn check_input(&self, chunk: &AudioChunk, window_samples: usize) -> Result<()> {
        chunk.expect_sample_rate(SAMPLE_RATE)?;
        if window_samples == 0 {
            return Err(FormatError::ZeroWindow.into());
        }
        Ok(())
    }

    fn scan(&mut self, chunk: &AudioChunk, window_samples: usize) -> Result<Vec<ScoredWindow>> {
        self.tracker.ensure_state(1, SAMPLE_RATE);
        scan::scan(
            &chunk.samples,
            window_samples,
            SAMPLE_RATE,
            self.scorer.as_mut(),
            &mut self.tracker,
        )
    }
}
