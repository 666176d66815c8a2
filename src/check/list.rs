#[cfg(test)]
mod list_test;

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use log::debug;

use super::{Check, CheckId, CheckState, CHECK_NAME_LEN};
use crate::candidate::table::CandidateTable;
use crate::candidate::{CandidateId, CandidateType};
use crate::check::pair_priority::pair_priority;
use crate::control::Role;
use crate::error::{Error, Result};
use crate::network_type::NetworkType;

/// The closed set of check-list states (spec §3, §9 "Sum types").
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CheckListState {
    Idle,
    Running,
    Completed,
}

impl fmt::Display for CheckListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Completed => "Completed",
        };
        write!(f, "{s}")
    }
}

/// The ordered, pruned sequence of candidate pairs for one component set
/// (spec §3 "Check List", §4.4).
#[derive(Debug)]
pub struct CheckList {
    checks: Vec<Check>,
    pub state: CheckListState,
    max_checks: usize,
}

/// Renders `"{local}:{port}-->{remote}:{port}"`, matching the original's
/// `dump_check`, truncated to `CHECK_NAME_LEN` bytes. Debug/logging aid only.
#[must_use]
pub fn dump_check(check: &Check, local: &CandidateTable, remote: &CandidateTable) -> String {
    let l = local.get(check.local).map_or_else(|| "?".to_string(), |c| c.address.to_string());
    let r = remote.get(check.remote).map_or_else(|| "?".to_string(), |c| c.address.to_string());
    let s = format!("{l}-->{r}");
    s.chars().take(CHECK_NAME_LEN).collect()
}

/// Effective local address for pairing/pruning: a ServerReflexive
/// candidate's base, otherwise its own address (spec §3, §4.4). Probes can
/// only be sent from a base address, never a reflexive one.
fn effective_local_address(local_table: &CandidateTable, id: CandidateId) -> Option<SocketAddr> {
    local_table.get(id).map(|c| {
        if c.candidate_type == CandidateType::ServerReflexive {
            c.base_address
        } else {
            c.address
        }
    })
}

impl CheckList {
    #[must_use]
    pub fn new(max_checks: usize) -> Self {
        Self {
            checks: Vec::new(),
            state: CheckListState::Idle,
            max_checks,
        }
    }

    #[must_use]
    pub fn get(&self, id: CheckId) -> Option<&Check> {
        self.checks.get(id.0)
    }

    pub fn get_mut(&mut self, id: CheckId) -> Option<&mut Check> {
        self.checks.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckId, &Check)> {
        self.checks.iter().enumerate().map(|(i, c)| (CheckId(i), c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Builds the check list from the local/remote candidate sets per spec
    /// §4.4: pair same-component same-family candidates, sort by descending
    /// priority (stable), substitute ServerReflexive locals with their base
    /// and dedupe, cap at `max_checks`. Grounded on the original's
    /// `pj_ice_create_check_list`, `sort_checklist`, `prune_checklist`.
    pub fn build(local: &CandidateTable, remote: &CandidateTable, role: Role, max_checks: usize) -> Result<Self> {
        let mut pairs = Vec::new();

        for (local_id, l) in local.iter() {
            for (remote_id, r) in remote.iter() {
                if l.component_id != r.component_id || NetworkType::of(&l.address.ip()) != NetworkType::of(&r.address.ip()) {
                    continue;
                }
                let priority = pair_priority(role, l.priority, r.priority);
                pairs.push((local_id, remote_id, priority));
            }
        }

        // Stable sort descending: insertion order already reflects
        // candidate-table append order, so equal-priority ties keep it.
        pairs.sort_by(|a, b| b.2.cmp(&a.2));

        let mut list = Self::new(max_checks);
        for (local_id, remote_id, priority) in pairs {
            list.push_check(Check::new(local_id, remote_id, priority))?;
        }

        list.prune(local, remote);
        Ok(list)
    }

    fn push_check(&mut self, check: Check) -> Result<()> {
        if self.checks.len() >= self.max_checks {
            return Err(Error::TooManyChecks);
        }
        self.checks.push(check);
        Ok(())
    }

    /// Appends a new check for a triggered-check pair not already in the
    /// list (spec §4.7 step 8). Returns its id.
    pub fn append_triggered(&mut self, local: CandidateId, remote: CandidateId, priority: u64, nominated: bool) -> Result<CheckId> {
        let mut check = Check::new(local, remote, priority);
        check.state = CheckState::Waiting;
        check.nominated = nominated;
        self.push_check(check)?;
        Ok(CheckId(self.checks.len() - 1))
    }

    /// Finds an existing check for `(local, remote)`, if any.
    #[must_use]
    pub fn find(&self, local: CandidateId, remote: CandidateId) -> Option<CheckId> {
        self.checks
            .iter()
            .position(|c| c.local == local && c.remote == remote)
            .map(CheckId)
    }

    /// Removes a pair if its effective local address and remote address
    /// duplicate a higher-priority pair's (checks are already sorted
    /// descending, so iteration order is priority order).
    fn prune(&mut self, local_table: &CandidateTable, remote_table: &CandidateTable) {
        let mut seen: HashSet<(SocketAddr, SocketAddr)> = HashSet::new();
        let mut kept = Vec::with_capacity(self.checks.len());

        for (i, check) in self.checks.iter().enumerate() {
            let Some(effective_local) = effective_local_address(local_table, check.local) else {
                continue;
            };
            let Some(remote_addr) = remote_table.get(check.remote).map(|c| c.address) else {
                continue;
            };

            if !seen.insert((effective_local, remote_addr)) {
                debug!("check {i} pruned as duplicate of a higher-priority pair");
                continue;
            }
            kept.push(check.clone());
        }

        self.checks = kept;
    }

    /// Highest-priority check in `state`, if any (spec §4.5 step 2).
    #[must_use]
    pub fn highest_priority_in_state(&self, state: CheckState) -> Option<CheckId> {
        self.checks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.state == state)
            .max_by_key(|(_, c)| c.priority)
            .map(|(i, _)| CheckId(i))
    }

    /// True once every check is terminal (spec §4.5 step 3, §4.8).
    #[must_use]
    pub fn all_terminal(&self) -> bool {
        self.checks.iter().all(|c| c.state.is_terminal())
    }
}
