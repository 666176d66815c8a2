#[cfg(test)]
mod scheduler_test;

use crate::check::list::{CheckList, CheckListState};
use crate::check::{CheckId, CheckState};

/// Interval between scheduler ticks (spec §4.5 "Ta"), matching the
/// original's `PJ_ICE_TA_VAL`.
pub const TA_MILLIS: u64 = 20;

/// What the scheduler decided to do on this tick (spec §4.5). The caller
/// (the session) is responsible for actually sending the chosen check's
/// probe and re-arming the timer iff `Perform` is returned.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedulerAction {
    Perform(CheckId),
    /// Nothing is Waiting or Frozen, but some check is still InProgress; the
    /// caller should re-arm the timer and try again next tick.
    Idle,
    Completed,
}

/// One scheduler tick (spec §4.5): marks the list Running, picks the
/// highest-priority Waiting check, falling back to the highest-priority
/// Frozen check if none is Waiting. If neither exists and every check has
/// reached a terminal state, the list is Completed; otherwise some check is
/// still InProgress awaiting its response, so the tick is a no-op.
/// Grounded on the original's `start_periodic_check`.
pub fn tick(checklist: &mut CheckList) -> SchedulerAction {
    checklist.state = CheckListState::Running;

    if let Some(id) = checklist.highest_priority_in_state(CheckState::Waiting) {
        return SchedulerAction::Perform(id);
    }
    if let Some(id) = checklist.highest_priority_in_state(CheckState::Frozen) {
        return SchedulerAction::Perform(id);
    }

    if !checklist.all_terminal() {
        return SchedulerAction::Idle;
    }

    checklist.state = CheckListState::Completed;
    SchedulerAction::Completed
}

/// Seeds the initial Waiting set (spec §4.5 "Kickoff"): the single
/// highest-priority check starts Waiting, and so does every other check
/// sharing its component but not its foundation. Grounded on the
/// original's `pj_ice_start_check`.
pub fn seed_initial_waiting(checklist: &mut CheckList, local_table: &crate::candidate::table::CandidateTable) {
    let Some((first_id, first_component, first_foundation)) = checklist.iter().next().map(|(id, check)| {
        let local = local_table.get(check.local);
        (id, local.map(|c| c.component_id), local.map(|c| c.foundation.clone()))
    }) else {
        return;
    };

    if let Some(check) = checklist.get_mut(first_id) {
        check.state = CheckState::Waiting;
    }

    let ids: Vec<CheckId> = checklist.iter().map(|(id, _)| id).collect();
    for id in ids {
        if id == first_id {
            continue;
        }
        let Some(check) = checklist.get(id) else { continue };
        let Some(local) = local_table.get(check.local) else { continue };
        if Some(local.component_id) == first_component && Some(local.foundation.clone()) != first_foundation {
            if let Some(check) = checklist.get_mut(id) {
                check.state = CheckState::Waiting;
            }
        }
    }
}
