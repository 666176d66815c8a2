
pub mod table;

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Arena index of a [`Candidate`] within a [`table::CandidateTable`].
///
/// Tables are append-only for the lifetime of a session (spec §9 "Cyclic
/// references"), so an id obtained from `add_candidate` stays valid until the
/// session is destroyed, even across the "redundant candidate" tombstoning
/// described on [`Candidate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub usize);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of candidate kinds (spec §3, §9 "Sum types").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateType {
    Host,
    ServerReflexive,
    PeerReflexive,
    Relayed,
}

impl CandidateType {
    /// `type_pref` term of the priority formula (spec §3). Host outranks
    /// ServerReflexive outranks PeerReflexive outranks Relayed.
    #[must_use]
    pub const fn type_pref(self) -> u32 {
        match self {
            Self::Host => 126,
            Self::PeerReflexive => 110,
            Self::ServerReflexive => 100,
            Self::Relayed => 0,
        }
    }

    /// The literal foundation-class token spec §4.2/§4.6/§4.7 uses for
    /// candidates of this type discovered by the core itself (gathering or
    /// probing). A gathered ServerReflexive/Relayed candidate is still
    /// assigned its class token here; the distinguishing "same foundation"
    /// test (spec §3) additionally requires same source/base and protocol,
    /// which `table::CandidateTable::add_candidate` enforces separately.
    #[must_use]
    pub const fn foundation_class(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::ServerReflexive => "srfx",
            Self::PeerReflexive => "peer",
            Self::Relayed => "rlyd",
        }
    }
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Host => "host",
            Self::ServerReflexive => "srflx",
            Self::PeerReflexive => "prflx",
            Self::Relayed => "relay",
        };
        write!(f, "{s}")
    }
}

/// Highest `local_pref` a candidate can carry (spec §3's `local_pref ∈ [0,
/// 65535]` invariant); host and peer-reflexive candidates always use it
/// (spec §4.2, §4.3, §4.6).
pub const MAX_LOCAL_PREF: u32 = 65535;

/// A transport address the session can probe or be probed on (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub component_id: u16,
    pub candidate_type: CandidateType,
    pub foundation: String,
    pub address: SocketAddr,
    pub base_address: SocketAddr,
    pub server_address: Option<SocketAddr>,
    pub local_pref: u32,
    pub priority: u32,

    /// Set when `table::CandidateTable::add_candidate` finds this candidate
    /// redundant with a higher-priority one already in the table (spec §3:
    /// "the lower-priority one is removed"). The table is append-only, so
    /// removal is a tombstone rather than a physical delete: the id stays
    /// valid, but the candidate is excluded from iteration and pairing.
    pub removed: bool,
}

impl Candidate {
    /// Computes `priority` per spec §3:
    /// `2^24 · type_pref + 2^8 · local_pref + (256 − component_id)`.
    #[must_use]
    pub fn compute_priority(candidate_type: CandidateType, local_pref: u32, component_id: u16) -> u32 {
        let type_pref = u64::from(candidate_type.type_pref());
        let local_pref = u64::from(local_pref);
        let component_term = 256_u64 - u64::from(component_id.min(255));
        let priority = (1u64 << 24) * type_pref + (1u64 << 8) * local_pref + component_term;
        priority as u32
    }

    #[must_use]
    pub fn new(
        component_id: u16,
        candidate_type: CandidateType,
        foundation: impl Into<String>,
        address: SocketAddr,
        base_address: SocketAddr,
        server_address: Option<SocketAddr>,
        local_pref: u32,
    ) -> Self {
        let priority = Self::compute_priority(candidate_type, local_pref, component_id);
        Self {
            component_id,
            candidate_type,
            foundation: foundation.into(),
            address,
            base_address,
            server_address,
            local_pref,
            priority,
            removed: false,
        }
    }

    /// Two candidates share a foundation iff same type, same source/base,
    /// same protocol (spec §3). This crate only speaks UDP (§1 non-goal:
    /// "no ... beyond address-family equality in pairing"), so protocol
    /// always matches; base_address stands in for "source".
    #[must_use]
    pub fn shares_foundation(&self, other: &Self) -> bool {
        self.candidate_type == other.candidate_type && self.base_address == other.base_address
    }

    /// Redundant per spec §3: same effective `(address, base_address)`.
    #[must_use]
    pub fn is_redundant_with(&self, other: &Self) -> bool {
        self.address == other.address && self.base_address == other.base_address
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.candidate_type, self.foundation, self.address)
    }
}

/// Validates spec §3's `component_id ≥ 1` invariant at every public
/// candidate-construction entry point.
pub fn check_component_id(component_id: u16) -> Result<()> {
    if component_id < 1 {
        return Err(Error::InvalidArgument("component_id must be >= 1".into()));
    }
    Ok(())
}
