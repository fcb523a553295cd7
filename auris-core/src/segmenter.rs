//! Consolidates per-window speech probabilities into padded speech segments.
//!
//! ## Algorithm
//!
//! One forward pass over the window probabilities drives a small state
//! machine with two thresholds (`threshold` to enter speech, `threshold -
//! 0.15` to leave it) so borderline windows cannot toggle the decision back
//! and forth. On top of the hysteresis sit the timing rules:
//!
//! 1. silence shorter than `min_silence_duration_ms` never closes a segment;
//! 2. a closed segment shorter than `min_speech_duration_ms` is discarded as
//!    noise;
//! 3. a segment exceeding `max_speech_duration_s` is split, preferably at the
//!    last silence long enough to be a safe cut point (`prev_end`), otherwise
//!    at the current position;
//! 4. every surviving segment is widened by `speech_pad_ms`, with close
//!    neighbours sharing their gap evenly instead of overlapping.
//!
//! The machine is a plain value advanced by one transition per window, so the
//! transition table is unit-testable without any model or I/O.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::ScoredWindow;

/// How far below `threshold` a probability must fall to count as silence.
const NEG_THRESHOLD_MARGIN: f32 = 0.15;

/// Silence at least this long (seconds) marks a safe split point for an
/// over-long segment even before the hard duration cap fires.
const SAFE_SPLIT_SILENCE_SECS: f32 = 0.098;

/// Tunables for segmentation.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Speech probability at or above which a window counts as speech.
    pub threshold: f32,
    /// Closed segments shorter than this are discarded as noise.
    pub min_speech_duration_ms: u64,
    /// Hard cap on one segment's length; longer runs are split.
    pub max_speech_duration_s: f32,
    /// Silence must last at least this long to close a segment.
    pub min_silence_duration_ms: u64,
    /// Padding added on both sides of each final segment.
    pub speech_pad_ms: u64,
    /// Samples per scoring window.
    pub window_samples: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_speech_duration_ms: 250,
            max_speech_duration_s: 30.0,
            min_silence_duration_ms: 100,
            speech_pad_ms: 30,
            window_samples: crate::detector::DEFAULT_WINDOW_SAMPLES,
        }
    }
}

/// A contiguous sample range classified as speech, padding included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// First sample of the utterance.
    pub start: usize,
    /// End of the utterance range; never exceeds the source buffer length.
    pub end: usize,
}

/// Sample-count thresholds derived once per run.
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    threshold: f32,
    neg_threshold: f32,
    min_speech_samples: usize,
    max_speech_samples: usize,
    min_silence_samples: usize,
    min_silence_samples_at_max: usize,
    speech_pad_samples: usize,
}

impl Thresholds {
    fn derive(sample_rate: u32, config: &SegmentConfig) -> Self {
        let sr = u64::from(sample_rate);
        Self {
            threshold: config.threshold,
            neg_threshold: config.threshold - NEG_THRESHOLD_MARGIN,
            min_speech_samples: (sr * config.min_speech_duration_ms / 1000) as usize,
            max_speech_samples: (sample_rate as f32 * config.max_speech_duration_s) as usize,
            min_silence_samples: (sr * config.min_silence_duration_ms / 1000) as usize,
            min_silence_samples_at_max: (sample_rate as f32 * SAFE_SPLIT_SILENCE_SECS) as usize,
            speech_pad_samples: (sr * config.speech_pad_ms / 1000) as usize,
        }
    }
}

/// The per-window state machine.
///
/// `temp_end`, `prev_end` and `next_start` use 0 as their unset sentinel,
/// matching the transition rules: a silence candidate at position 0 can only
/// arise before any speech has triggered, where it is irrelevant.
#[derive(Debug, Default, Clone)]
struct Machine {
    /// Inside a candidate speech region.
    triggered: bool,
    /// Start of the open candidate segment.
    current_start: usize,
    /// Provisional silence start: where the open segment will close if the
    /// silence lasts (0 = unset).
    temp_end: usize,
    /// Start of the last silence long enough to be a safe split point
    /// (0 = unset).
    prev_end: usize,
    /// Where speech resumed after the `prev_end` silence (0 = unset).
    next_start: usize,
}

impl Machine {
    /// Advance by one window at sample position `pos` with probability `p`,
    /// appending any segment that closes to `out`.
    fn step(&mut self, pos: usize, p: f32, th: &Thresholds, out: &mut Vec<Segment>) {
        if p >= th.threshold && self.temp_end != 0 {
            // Speech resumed before the silence candidate matured.
            self.temp_end = 0;
            if self.next_start < self.prev_end {
                self.next_start = pos;
            }
        }

        if p >= th.threshold && !self.triggered {
            self.triggered = true;
            self.current_start = pos;
            return;
        }

        if self.triggered && pos - self.current_start > th.max_speech_samples {
            if self.prev_end != 0 {
                // Split at the last safe silence. The remainder either stays
                // triggered from where speech resumed, or is dropped when
                // speech had already resumed before that silence.
                out.push(Segment {
                    start: self.current_start,
                    end: self.prev_end,
                });
                if self.next_start < self.prev_end {
                    self.triggered = false;
                } else {
                    self.current_start = self.next_start;
                }
                self.prev_end = 0;
                self.next_start = 0;
                self.temp_end = 0;
            } else {
                out.push(Segment {
                    start: self.current_start,
                    end: pos,
                });
                self.triggered = false;
                self.prev_end = 0;
                self.next_start = 0;
                self.temp_end = 0;
                return;
            }
        }

        if p < th.neg_threshold && self.triggered {
            if self.temp_end == 0 {
                self.temp_end = pos;
            }
            if pos - self.temp_end > th.min_silence_samples_at_max {
                self.prev_end = self.temp_end;
            }
            if pos - self.temp_end < th.min_silence_samples {
                return;
            }
            let start = self.current_start;
            let end = self.temp_end;
            if end - start > th.min_speech_samples {
                out.push(Segment { start, end });
            }
            self.triggered = false;
            self.prev_end = 0;
            self.next_start = 0;
            self.temp_end = 0;
        }
    }

    /// Close a segment left open at the end of the scan.
    ///
    /// Openness is the trigger flag itself, not `current_start > 0`, so
    /// speech that began at sample 0 and never dropped below the exit
    /// threshold is still emitted.
    fn finish(&self, total_samples: usize, th: &Thresholds, out: &mut Vec<Segment>) {
        if self.triggered && total_samples - self.current_start > th.min_speech_samples {
            out.push(Segment {
                start: self.current_start,
                end: total_samples,
            });
        }
    }
}

/// Widen each segment by the pad, sharing small gaps evenly.
fn pad_segments(segments: &mut [Segment], total_samples: usize, pad: usize) {
    if segments.is_empty() {
        return;
    }

    segments[0].start = segments[0].start.saturating_sub(pad);
    for i in 0..segments.len() {
        if i + 1 < segments.len() {
            let gap = segments[i + 1].start.saturating_sub(segments[i].end);
            if gap < 2 * pad {
                segments[i].end += gap / 2;
                segments[i + 1].start = segments[i + 1].start.saturating_sub(gap / 2);
            } else {
                segments[i].end = (segments[i].end + pad).min(total_samples);
                segments[i + 1].start = segments[i + 1].start.saturating_sub(pad);
            }
        } else {
            segments[i].end = (segments[i].end + pad).min(total_samples);
        }
    }
}

/// Consolidate an ordered probability sequence into padded speech segments.
///
/// `scores` must be in increasing window order, as produced by a detection
/// scan; the machine is order-dependent and non-commutative.
pub fn segment_scores(
    scores: &[ScoredWindow],
    total_samples: usize,
    sample_rate: u32,
    config: &SegmentConfig,
) -> Vec<Segment> {
    let th = Thresholds::derive(sample_rate, config);
    let mut machine = Machine::default();
    let mut out = Vec::new();

    for (i, w) in scores.iter().enumerate() {
        machine.step(config.window_samples * i, w.probability, &th, &mut out);
    }
    machine.finish(total_samples, &th, &mut out);

    pad_segments(&mut out, total_samples, th.speech_pad_samples);

    debug!(
        windows = scores.len(),
        segments = out.len(),
        "segmentation complete"
    );
    out
}
