use super::*;
use crate::candidate::CandidateId;

#[test]
fn test_new_check_starts_frozen() {
    let c = Check::new(CandidateId(0), CandidateId(1), 42);
    assert_eq!(c.state, CheckState::Frozen);
    assert!(!c.nominated);
    assert!(c.err_code.is_none());
}

#[test]
fn test_set_state_records_err_code() {
    let mut c = Check::new(CandidateId(0), CandidateId(1), 42);
    c.set_state(CheckState::Failed, Some(Error::Cancelled));
    assert_eq!(c.state, CheckState::Failed);
    assert_eq!(c.err_code, Some(Error::Cancelled));
}

#[test]
fn test_set_state_ignores_backward_transition() {
    let mut c = Check::new(CandidateId(0), CandidateId(1), 42);
    c.set_state(CheckState::InProgress, None);
    c.set_state(CheckState::Waiting, None);
    assert_eq!(c.state, CheckState::InProgress);
}

#[test]
fn test_set_state_ignores_reentry_after_terminal() {
    let mut c = Check::new(CandidateId(0), CandidateId(1), 42);
    c.set_state(CheckState::Failed, Some(Error::Cancelled));
    c.set_state(CheckState::Succeeded, None);
    assert_eq!(c.state, CheckState::Failed);
    assert_eq!(c.err_code, Some(Error::Cancelled));
}

#[test]
fn test_terminal_states() {
    assert!(CheckState::Succeeded.is_terminal());
    assert!(CheckState::Failed.is_terminal());
    assert!(!CheckState::Frozen.is_terminal());
    assert!(!CheckState::Waiting.is_terminal());
    assert!(!CheckState::InProgress.is_terminal());
}
