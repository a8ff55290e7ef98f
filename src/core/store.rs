/// Play state store: the single owner of the current play state.

use crate::schema::state::{ClampPolicy, PlayState, StatePatch};

/// Holds the current [`PlayState`] and replaces it whole on every patch.
#[derive(Debug, Clone)]
pub struct PlayStateStore {
    current: PlayState,
    policy: ClampPolicy,
}

impl Default for PlayStateStore {
    fn default() -> Self {
        Self::new(ClampPolicy::default())
    }
}

impl PlayStateStore {
    pub fn new(policy: ClampPolicy) -> Self {
        Self {
            current: PlayState::initial(),
            policy,
        }
    }

    pub fn current(&self) -> &PlayState {
        &self.current
    }

    pub fn policy(&self) -> ClampPolicy {
        self.policy
    }

    /// Merge `patch` over the current state and make the result current.
    pub fn apply(&mut self, patch: &StatePatch) -> &PlayState {
        if !patch.is_empty() {
            self.current = self.current.merged(patch, self.policy);
            let drift = self.current.out_of_range();
            if !drift.is_empty() {
                tracing::debug!(fields = ?drift, "play state outside nominal range");
            }
        }
        &self.current
    }

    /// Discard all progress and return to the initial state.
    pub fn reset(&mut self) -> &PlayState {
        self.current = PlayState::initial();
        &self.current
    }
}
