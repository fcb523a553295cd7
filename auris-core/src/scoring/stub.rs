//! Deterministic stub scorers: exercise the pipeline without a model.
//!
//! Both stubs honor the full scorer contract, including handing back an
//! updated state, so the scan loop and segmenter can be tested end-to-end
//! against them.

use crate::error::ScoreError;
use crate::scoring::{Scored, WindowScorer};
use crate::state::RecurrentState;

/// Scores each window by its peak absolute amplitude.
///
/// The probability is a pure function of the window's samples, which makes
/// repeat scans over the same buffer bit-identical (useful for golden tests
/// and downstream dry runs). The returned state records the probability in
/// its first hidden unit so state replacement is observable.
#[derive(Debug, Default)]
pub struct AmplitudeScorer;

impl WindowScorer for AmplitudeScorer {
    fn score(
        &mut self,
        window: &[f32],
        _sample_rate: u32,
        state: RecurrentState,
    ) -> Result<Scored, ScoreError> {
        let probability = window
            .iter()
            .map(|s| s.abs())
            .fold(0.0f32, f32::max)
            .clamp(0.0, 1.0);

        let mut state = state;
        state.hidden_mut()[0] = probability;
        Ok(Scored { probability, state })
    }
}

/// Replays a fixed probability script, one entry per scored window.
///
/// Windows beyond the end of the script score 0.0. The script cursor is the
/// scorer's own state and is not affected by session resets.
#[derive(Debug)]
pub struct ScriptedScorer {
    script: Vec<f32>,
    cursor: usize,
}

impl ScriptedScorer {
    pub fn new(script: Vec<f32>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl WindowScorer for ScriptedScorer {
    fn score(
        &mut self,
        _window: &[f32],
        _sample_rate: u32,
        state: RecurrentState,
    ) -> Result<Scored, ScoreError> {
        let probability = self.script.get(self.cursor).copied().unwrap_or(0.0);
        self.cursor += 1;
        Ok(Scored { probability, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn amplitude_scorer_reports_peak() {
        let mut scorer = AmplitudeScorer;
        let window = vec![0.1, -0.6, 0.3, 0.0];
        let scored = scorer
            .score(&window, 16_000, RecurrentState::zeroed(1))
            .unwrap();
        assert_abs_diff_eq!(scored.probability, 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(scored.state.hidden()[0], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn amplitude_scorer_clamps_loud_input() {
        let mut scorer = AmplitudeScorer;
        let scored = scorer
            .score(&[2.5, -3.0], 16_000, RecurrentState::zeroed(1))
            .unwrap();
        assert_abs_diff_eq!(scored.probability, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn scripted_scorer_replays_then_falls_silent() {
        let mut scorer = ScriptedScorer::new(vec![0.9, 0.2]);
        let window = [0.0f32; 4];
        for expected in [0.9, 0.2, 0.0, 0.0] {
            let scored = scorer
                .score(&window, 16_000, RecurrentState::zeroed(1))
                .unwrap();
            assert_abs_diff_eq!(scored.probability, expected, epsilon = 1e-6);
        }
    }
}
