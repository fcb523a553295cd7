//! Recurrent scorer state and its per-session tracker.
//!
//! The scorer's LSTM memory is modeled as an owned value: the scan loop hands
//! the current state to the scorer and replaces it with the one the scorer
//! returns. Session isolation is therefore enforced by ownership: two
//! sessions cannot share a state without cloning it, and nothing here needs a
//! lock.

use tracing::debug;

/// Recurrent layers in the scorer state.
pub const STATE_LAYERS: usize = 2;
/// Hidden units per layer.
pub const STATE_HIDDEN: usize = 64;

/// The (hidden, cell) tensor pair carried between scoring calls.
///
/// Both tensors have shape `[STATE_LAYERS, batch_size, STATE_HIDDEN]`,
/// stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentState {
    hidden: Vec<f32>,
    cell: Vec<f32>,
    batch_size: usize,
}

impl RecurrentState {
    /// All-zero state for `batch_size` parallel sequences.
    pub fn zeroed(batch_size: usize) -> Self {
        let n = STATE_LAYERS * batch_size * STATE_HIDDEN;
        Self {
            hidden: vec![0.0; n],
            cell: vec![0.0; n],
            batch_size,
        }
    }

    /// Rebuild a state from raw tensor data returned by a scorer backend.
    ///
    /// Returns `None` when either tensor does not match the expected shape.
    pub fn from_parts(hidden: Vec<f32>, cell: Vec<f32>, batch_size: usize) -> Option<Self> {
        let n = STATE_LAYERS * batch_size * STATE_HIDDEN;
        (hidden.len() == n && cell.len() == n).then_some(Self {
            hidden,
            cell,
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn hidden(&self) -> &[f32] {
        &self.hidden
    }

    pub fn cell(&self) -> &[f32] {
        &self.cell
    }

    pub fn hidden_mut(&mut self) -> &mut [f32] {
        &mut self.hidden
    }

    pub fn cell_mut(&mut self) -> &mut [f32] {
        &mut self.cell
    }

    /// True if every hidden and cell unit is exactly zero.
    pub fn is_zeroed(&self) -> bool {
        self.hidden.iter().chain(self.cell.iter()).all(|&v| v == 0.0)
    }
}

/// Owns the recurrent state across calls within one detection session.
///
/// The last-seen `(batch_size, sample_rate)` pair lives here, per session
/// rather than in process-wide storage, so concurrent sessions cannot trip
/// each other's reinitialization.
#[derive(Debug)]
pub struct StateTracker {
    state: RecurrentState,
    /// `None` forces the next `ensure_state` to reinitialize.
    seen: Option<(usize, u32)>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            state: RecurrentState::zeroed(1),
            seen: None,
        }
    }

    /// Zero the state if `(batch_size, sample_rate)` differs from the
    /// previous call, or if this is the first call since a reset. A repeat
    /// call with the same pair leaves the state untouched.
    pub fn ensure_state(&mut self, batch_size: usize, sample_rate: u32) {
        if self.seen != Some((batch_size, sample_rate)) {
            debug!(batch_size, sample_rate, "reinitializing recurrent state");
            self.state = RecurrentState::zeroed(batch_size);
            self.seen = Some((batch_size, sample_rate));
        }
    }

    /// Replace the held state with the one returned by the scorer. Called
    /// once per successful scoring call.
    pub fn update(&mut self, new_state: RecurrentState) {
        self.state = new_state;
    }

    pub fn state(&self) -> &RecurrentState {
        &self.state
    }

    /// Force zeroed state; the next `ensure_state` reinitializes regardless
    /// of its arguments.
    pub fn reset(&mut self) {
        self.state = RecurrentState::zeroed(self.state.batch_size);
        self.seen = None;
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirty_state() -> RecurrentState {
        let mut state = RecurrentState::zeroed(1);
        state.hidden_mut()[0] = 1.5;
        state.cell_mut()[3] = -0.25;
        state
    }

    #[test]
    fn zeroed_state_has_expected_shape() {
        let state = RecurrentState::zeroed(1);
        assert_eq!(state.hidden().len(), STATE_LAYERS * STATE_HIDDEN);
        assert_eq!(state.cell().len(), STATE_LAYERS * STATE_HIDDEN);
        assert!(state.is_zeroed());
    }

    #[test]
    fn from_parts_rejects_wrong_shapes() {
        assert!(RecurrentState::from_parts(vec![0.0; 128], vec![0.0; 128], 1).is_some());
        assert!(RecurrentState::from_parts(vec![0.0; 127], vec![0.0; 128], 1).is_none());
        assert!(RecurrentState::from_parts(vec![0.0; 128], vec![0.0; 64], 1).is_none());
    }

    #[test]
    fn repeat_ensure_with_same_parameters_preserves_state() {
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);
        tracker.update(dirty_state());

        tracker.ensure_state(1, 16_000);
        assert_eq!(tracker.state(), &dirty_state());
    }

    #[test]
    fn ensure_with_different_parameters_zeroes_state() {
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);
        tracker.update(dirty_state());

        tracker.ensure_state(1, 8_000);
        assert!(tracker.state().is_zeroed());

        tracker.update(dirty_state());
        tracker.ensure_state(2, 8_000);
        assert!(tracker.state().is_zeroed());
        assert_eq!(tracker.state().batch_size(), 2);
    }

    #[test]
    fn reset_forces_reinitialization_even_for_same_parameters() {
        let mut tracker = StateTracker::new();
        tracker.ensure_state(1, 16_000);
        tracker.update(dirty_state());

        tracker.reset();
        assert!(tracker.state().is_zeroed());

        // Same pair as before the reset must still reinitialize cleanly.
        tracker.update(dirty_state());
        tracker.ensure_state(1, 16_000);
        assert!(tracker.state().is_zeroed());
    }
}
