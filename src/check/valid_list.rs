#[cfg(test)]
mod valid_list_test;

use super::{CheckId, CheckState};
use crate::candidate::table::CandidateTable;
use crate::candidate::CandidateId;
use crate::check::list::CheckList;

/// An append-only projection of check-list indices whose checks reached
/// `Succeeded` (spec §3 "Valid List"), kept sorted by descending pair
/// priority on every insertion. Grounded on the original's `sort_valid_list`
/// / `ice->valid_list`.
#[derive(Debug, Default)]
pub struct ValidList {
    entries: Vec<CheckId>,
}

impl ValidList {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends `id` and re-sorts by descending priority (spec §4.6 step
    /// "append index to Valid List; re-sort Valid List"). `id` must name a
    /// `Succeeded` check (spec §8 invariant).
    pub fn insert(&mut self, id: CheckId, checklist: &CheckList) {
        debug_assert!(checklist.get(id).map(|c| c.state) == Some(CheckState::Succeeded));
        self.entries.push(id);
        self.entries.sort_by(|a, b| {
            let pa = checklist.get(*a).map_or(0, |c| c.priority);
            let pb = checklist.get(*b).map_or(0, |c| c.priority);
            pb.cmp(&pa)
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = CheckId> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if some entry whose local candidate belongs to `component_id`
    /// is nominated (spec §4.8 "Per-component nomination", "Overall
    /// success").
    #[must_use]
    pub fn has_nominated_for_component(&self, checklist: &CheckList, local_table: &CandidateTable, component_id: u16) -> bool {
        self.entries.iter().any(|id| {
            let Some(check) = checklist.get(*id) else { return false };
            check.nominated && candidate_component_id(local_table, check.local) == Some(component_id)
        })
    }
}

fn candidate_component_id(table: &CandidateTable, id: CandidateId) -> Option<u16> {
    table.get(id).map(|c| c.component_id)
}
