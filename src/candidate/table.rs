#[cfg(test)]
mod table_test;

use std::net::SocketAddr;

use log::{debug, trace};

use super::{Candidate, CandidateId};
use crate::error::{Error, Result};

/// An append-only arena of candidates (spec §9: "prefer an arena with
/// integer indices ... candidate tables are append-only within a session
/// lifetime so indices never invalidate"). A session holds one table for
/// its local candidates and one for the remote candidates it has been told
/// about via `add_remote_candidates`.
#[derive(Debug, Default)]
pub struct CandidateTable {
    candidates: Vec<Candidate>,
    max_candidates: usize,
}

impl CandidateTable {
    #[must_use]
    pub fn new(max_candidates: usize) -> Self {
        Self {
            candidates: Vec::new(),
            max_candidates,
        }
    }

    #[must_use]
    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        self.candidates.get(id.0)
    }

    pub fn get_mut(&mut self, id: CandidateId) -> Option<&mut Candidate> {
        self.candidates.get_mut(id.0)
    }

    /// Iterates the *active* (non-tombstoned) candidates, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (CandidateId, &Candidate)> {
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.removed)
            .map(|(i, c)| (CandidateId(i), c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.iter().filter(|c| !c.removed).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_address(&self, component_id: u16, address: SocketAddr) -> Option<CandidateId> {
        self.iter()
            .find(|(_, c)| c.component_id == component_id && c.address == address)
            .map(|(id, _)| id)
    }

    pub fn find_by_base_address(&self, component_id: u16, base_address: SocketAddr) -> Option<CandidateId> {
        self.iter()
            .find(|(_, c)| c.component_id == component_id && c.base_address == base_address)
            .map(|(id, _)| id)
    }

    /// Appends `candidate`, eliminating redundancy per spec §3: if an
    /// existing active candidate has the same `(address, base_address)`,
    /// the lower-priority one is tombstoned and the higher-priority one
    /// survives. Enforces `MAX_CANDIDATES` (spec §6, tested by scenario 5).
    pub fn add_candidate(&mut self, candidate: Candidate) -> Result<CandidateId> {
        if self.len() >= self.max_candidates {
            return Err(Error::TooManyCandidates);
        }

        for existing in &mut self.candidates {
            if existing.removed || !existing.is_redundant_with(&candidate) {
                continue;
            }
            if candidate.priority <= existing.priority {
                trace!(
                    "dropping redundant candidate {} (priority {} <= existing {})",
                    candidate.address,
                    candidate.priority,
                    existing.priority
                );
                // The new candidate never enters the table; no slot is consumed.
                return Ok(self.find_by_address(existing.component_id, existing.address).unwrap());
            }
            debug!(
                "candidate {} supersedes lower-priority redundant candidate at the same address",
                candidate.address
            );
            existing.removed = true;
        }

        let id = CandidateId(self.candidates.len());
        self.candidates.push(candidate);
        Ok(id)
    }
}
