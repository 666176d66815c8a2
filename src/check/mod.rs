#[cfg(test)]
mod check_test;
pub mod list;
pub mod pair_priority;
pub mod valid_list;

use std::fmt;

use serde::Serialize;

use crate::candidate::CandidateId;
use crate::error::Error;

/// Debug-name cap shared with the original's `CHECK_NAME_LEN` (spec §6
/// tunable); bounds `Check`'s `Display` impl, used only for logging.
pub const CHECK_NAME_LEN: usize = 128;

/// The closed set of check states (spec §3, §9 "Sum types"). Strictly
/// monotonic: `Frozen → Waiting → InProgress → {Succeeded, Failed}`, never
/// re-entered once `Succeeded` or `Failed` (spec §8).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum CheckState {
    Frozen,
    Waiting,
    InProgress,
    Succeeded,
    Failed,
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Frozen => "Frozen",
            Self::Waiting => "Waiting",
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

impl CheckState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Position in the `Frozen → Waiting → InProgress → {Succeeded, Failed}`
    /// ordering (spec §8); `Succeeded` and `Failed` share the terminal rank
    /// since neither can transition into the other.
    const fn rank(self) -> u8 {
        match self {
            Self::Frozen => 0,
            Self::Waiting => 1,
            Self::InProgress => 2,
            Self::Succeeded | Self::Failed => 3,
        }
    }
}

/// Arena index of a [`Check`] within a [`list::CheckList`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckId(pub usize);

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate pair and the state of its connectivity check (spec §3).
#[derive(Debug, Clone)]
pub struct Check {
    pub local: CandidateId,
    pub remote: CandidateId,
    pub priority: u64,
    pub state: CheckState,
    pub nominated: bool,
    pub err_code: Option<Error>,
}

impl Check {
    #[must_use]
    pub fn new(local: CandidateId, remote: CandidateId, priority: u64) -> Self {
        Self {
            local,
            remote,
            priority,
            state: CheckState::Frozen,
            nominated: false,
            err_code: None,
        }
    }

    /// Applies `state`, enforcing spec §8's strict monotonicity: once
    /// `Frozen → Waiting → InProgress → {Succeeded, Failed}` reaches a
    /// terminal state it is never re-entered, and the rank never moves
    /// backward. A call that would violate either rule is logged and
    /// ignored rather than applied.
    pub fn set_state(&mut self, state: CheckState, err_code: Option<Error>) {
        if self.state.is_terminal() {
            log::trace!(
                "check {}->{}: ignoring transition to {} from terminal state {}",
                self.local,
                self.remote,
                state,
                self.state
            );
            return;
        }
        if state.rank() < self.state.rank() {
            log::trace!(
                "check {}->{}: ignoring backward transition from {} to {}",
                self.local,
                self.remote,
                self.state,
                state
            );
            return;
        }

        log::debug!(
            "check {}->{}: state changed from {} to {}",
            self.local,
            self.remote,
            self.state,
            state
        );
        self.state = state;
        self.err_code = err_code;
    }
}
