use std::net::SocketAddr;

use serde::Serialize;

use crate::candidate::CandidateType;
use crate::check::CheckState;

/// One entry of [`crate::session::Session::get_candidate_pairs_stats`] (spec
/// §10.4 ambient diagnostics). Grounded on the shape of the original's
/// `CandidatePairStats`, trimmed to the fields this crate can actually
/// populate: no packet/byte counters or round-trip timing, since media flow
/// and consent-freshness are out of scope (spec §1 Non-goals).
#[derive(Debug, Clone, Serialize)]
pub struct CandidatePairStats {
    pub local_candidate: SocketAddr,
    pub remote_candidate: SocketAddr,
    pub state: CheckState,
    pub nominated: bool,
    pub priority: u64,
}

/// One entry of [`crate::session::Session::get_local_candidates_stats`].
/// Grounded on the original's `CandidateStats`, trimmed the same way.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateStats {
    pub candidate_type: CandidateType,
    pub address: SocketAddr,
    pub priority: u32,
}
