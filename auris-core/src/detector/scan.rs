//! The sequential window scan: windower + scorer + state tracker.

use tracing::debug;

use crate::buffering::window;
use crate::error::Result;
use crate::scoring::WindowScorer;
use crate::state::StateTracker;

use super::ScoredWindow;

/// Score every window of `samples` in increasing order.
///
/// A short final window is zero-padded to `window_samples` before scoring,
/// but its reported range keeps the real sample count. Any scorer failure
/// aborts the scan with no partial output: the tracker's state would be
/// stale for every window after the failure.
pub fn scan(
    samples: &[f32],
    window_samples: usize,
    sample_rate: u32,
    scorer: &mut dyn WindowScorer,
    tracker: &mut StateTracker,
) -> Result<Vec<ScoredWindow>> {
    let windows = window::divide(samples.len(), window_samples);
    let mut out = Vec::with_capacity(windows.len());

    let mut padded = vec![0.0f32; window_samples];
    for w in windows {
        let slice = &samples[w.start..w.start + w.len];
        let scored = if w.len == window_samples {
            scorer.score(slice, sample_rate, tracker.state().clone())?
        } else {
            padded[..w.len].copy_from_slice(slice);
            padded[w.len..].fill(0.0);
            scorer.score(&padded, sample_rate, tracker.state().clone())?
        };
        tracker.update(scored.state);
        out.push(ScoredWindow {
            probability: scored.probability,
            start: w.start,
            end: w.last_sample(),
        });
    }

    debug!(windows = out.len(), window_samples, "window scan complete");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DetectError, ScoreError};
    use crate::scoring::Scored;
    use crate::state::RecurrentState;

    /// Records every window it is handed; scores windows by call order.
    struct ProbeScorer {
        seen: Vec<Vec<f32>>,
        fail_at: Option<usize>,
    }

    impl ProbeScorer {
        fn new() -> Self {
            Self {
                seen: Vec::new(),
                fail_at: None,
            }
        }

        fn failing_at(call: usize) -> Self {
            Self {
                seen: Vec::new(),
                fail_at: Some(call),
            }
        }
    }

    impl WindowScorer for ProbeScorer {
        fn score(
            &mut self,
            window: &[f32],
            _sample_rate: u32,
            state: RecurrentState,
        ) -> std::result::Result<Scored, ScoreError> {
            if self.fail_at == Some(self.seen.len()) {
                return Err(ScoreError::MalformedOutput("probe fault".into()));
            }
            self.seen.push(window.to_vec());
            let probability = self.seen.len() as f32 / 100.0;
            let mut state = state;
            state.hidden_mut()[0] += 1.0;
            Ok(Scored { probability, state })
        }
    }

    #[test]
    fn short_final_window_is_zero_padded_for_scoring_only() {
        let samples: Vec<f32> = (0..700).map(|i| (i % 10) as f32 * 0.05).collect();
        let mut scorer = ProbeScorer::new();
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);

        let out = scan(&samples, 512, 16_000, &mut scorer, &mut tracker).unwrap();

        assert_eq!(out.len(), 2);
        // Both windows reach the scorer at full size.
        assert_eq!(scorer.seen[0].len(), 512);
        assert_eq!(scorer.seen[1].len(), 512);
        // Padding is zeros beyond the real tail.
        assert_eq!(scorer.seen[1][..188], samples[512..]);
        assert!(scorer.seen[1][188..].iter().all(|&s| s == 0.0));
        // Reported ranges keep the real sample counts.
        assert_eq!((out[0].start, out[0].end), (0, 511));
        assert_eq!((out[1].start, out[1].end), (512, 699));
    }

    #[test]
    fn windows_are_scored_in_order_and_state_advances() {
        let samples = vec![0.25f32; 2_048];
        let mut scorer = ProbeScorer::new();
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);

        let out = scan(&samples, 512, 16_000, &mut scorer, &mut tracker).unwrap();

        let probs: Vec<f32> = out.iter().map(|w| w.probability).collect();
        assert_eq!(probs, vec![0.01, 0.02, 0.03, 0.04]);
        // One tracker update per window.
        assert_eq!(tracker.state().hidden()[0], 4.0);
    }

    #[test]
    fn scorer_failure_aborts_with_no_partial_output() {
        let samples = vec![0.25f32; 2_048];
        let mut scorer = ProbeScorer::failing_at(2);
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);

        let err = scan(&samples, 512, 16_000, &mut scorer, &mut tracker).unwrap_err();
        assert!(matches!(err, DetectError::Scoring(_)));
    }

    #[test]
    fn empty_buffer_scans_to_nothing() {
        let mut scorer = ProbeScorer::new();
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);

        let out = scan(&[], 512, 16_000, &mut scorer, &mut tracker).unwrap();
        assert!(out.is_empty());
        assert!(scorer.seen.is_empty());
    }
}
