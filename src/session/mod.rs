#[cfg(test)]
mod session_test;

pub mod callbacks;
mod internal;

use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;

pub use callbacks::SessionCallbacks;

use internal::SessionInternal;

use crate::candidate::CandidateType;
use crate::check::CheckId;
use crate::control::Role;
use crate::error::Result;
use crate::gather::GatherCollaborator;
use crate::io::{PacketSender, TimerDriver, TimerHandle};
use crate::scheduler::TA_MILLIS;
use crate::stats::{CandidatePairStats, CandidateStats};

/// Check-list size cap (spec §6 tunable), matching the original's
/// `MAX_CHECKS` default.
pub const DEFAULT_MAX_CHECKS: usize = 100;

/// Candidate-table size cap (spec §6 tunable), matching the original's
/// `MAX_CAND` default.
pub const DEFAULT_MAX_CANDIDATES: usize = 100;

/// Resolution of spec §9's nomination Open Question, recorded in
/// `DESIGN.md`: regular nomination is the default, matching the original's
/// `PJ_ICE_SESS_DEFAULT_NOMINATE_MODE` default.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NominationPolicy {
    Regular,
    Aggressive,
}

impl Default for NominationPolicy {
    fn default() -> Self {
        Self::Regular
    }
}

/// Construction arguments for a [`Session`] (spec §4.1 `create`), grounded
/// on the shape of the original's `AgentConfig`/`pj_ice_sess_init`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub role: Role,
    /// Scheduler tick interval in milliseconds (spec §4.5 "Ta"). Defaults to
    /// [`TA_MILLIS`].
    pub ta_millis: u64,
    pub max_checks: usize,
    pub max_candidates: usize,
    pub nomination: NominationPolicy,
}

impl SessionConfig {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ta_millis: TA_MILLIS,
            max_checks: DEFAULT_MAX_CHECKS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            nomination: NominationPolicy::default(),
        }
    }
}

/// One remote candidate as it arrives from signaling (spec §4.1
/// `add_remote_candidates`). Priority is not recomputed locally: it is the
/// number the peer advertised, per spec §3's "wire format" note.
#[derive(Debug, Clone)]
pub struct RemoteCandidateInput {
    pub component_id: u16,
    pub candidate_type: CandidateType,
    pub foundation: String,
    pub address: SocketAddr,
    pub priority: u32,
}

/// A single connectivity-check session (spec §2 "Scope", §4 operations).
///
/// Holds its whole state behind one [`Mutex`] (spec §5 "Single-writer
/// core"): every public method locks once and delegates to
/// [`SessionInternal`], matching the original's single-threaded
/// `pj_ice_sess` guarded by the call discipline its embedder enforces, but
/// made explicit here since this crate has no event-loop of its own to rely
/// on for that guarantee.
pub struct Session {
    inner: Mutex<SessionInternal>,
}

impl Session {
    #[must_use]
    pub fn create(config: SessionConfig, timer: Box<dyn TimerDriver>, gather: Box<dyn GatherCollaborator>, callbacks: Box<dyn SessionCallbacks>) -> Self {
        Self {
            inner: Mutex::new(SessionInternal::new(config, timer, gather, callbacks)),
        }
    }

    /// Registers a component's bound socket (spec §4.1). Must be called
    /// before `start_gathering`.
    pub fn add_component(&self, component_id: u16, local_bound_address: SocketAddr, socket: Box<dyn PacketSender>) -> Result<()> {
        self.inner.lock().unwrap().add_component(component_id, local_bound_address, socket)
    }

    /// Sets the local/remote ufrag/password pair used to sign and verify
    /// STUN messages (spec §4.1, §3 "Credentials").
    pub fn set_credentials(&self, local_ufrag: &str, local_pwd: &str, remote_ufrag: &str, remote_pwd: &str) -> Result<()> {
        self.inner.lock().unwrap().set_credentials(local_ufrag, local_pwd, remote_ufrag, remote_pwd)
    }

    /// Gathers host candidates for every registered component, then asks
    /// the gathering collaborator for reflexive/relayed addresses (spec
    /// §4.2). `route_address` substitutes for a wildcard-bound component's
    /// socket address.
    pub fn start_gathering(&self, route_address: IpAddr) -> Result<()> {
        self.inner.lock().unwrap().start_gathering(route_address)
    }

    /// Stores the remote candidate set and (re)builds the check list (spec
    /// §4.1, §4.4).
    pub fn add_remote_candidates(&self, candidates: Vec<RemoteCandidateInput>) -> Result<()> {
        self.inner.lock().unwrap().add_remote_candidates(candidates)
    }

    /// Seeds the initial Waiting set and arms the scheduler timer (spec
    /// §4.5 "Kickoff"). Idempotent once the check list is running.
    pub fn start_checks(&self) -> Result<()> {
        self.inner.lock().unwrap().start_checks()
    }

    /// Feeds one inbound packet on `component_id`'s socket into the session
    /// (spec §4.1 `on_rx_pkt`, §4.6, §4.7).
    pub fn on_rx_packet(&self, component_id: u16, data: &[u8], src: SocketAddr) {
        self.inner.lock().unwrap().on_rx_packet(component_id, data, src);
    }

    /// Drives one scheduler tick (spec §4.5). `handle` must be the handle
    /// most recently returned by the session's [`TimerDriver`]; stale
    /// handles (an earlier tick that already fired, or one from before
    /// `destroy`) are ignored.
    pub fn on_timer_tick(&self, handle: TimerHandle) {
        self.inner.lock().unwrap().on_timer_tick(handle);
    }

    /// Reports that `check_id`'s outbound transaction timed out without a
    /// response, per whatever retransmit policy the embedder runs (spec §1
    /// Non-goals: "STUN transaction retransmission/timeout policy").
    pub fn on_check_timeout(&self, check_id: CheckId) {
        self.inner.lock().unwrap().on_check_timeout(check_id);
    }

    /// Snapshot of every candidate pair the check list currently holds
    /// (spec §10.4 ambient diagnostics).
    #[must_use]
    pub fn get_candidate_pairs_stats(&self) -> Vec<CandidatePairStats> {
        self.inner.lock().unwrap().candidate_pairs_stats()
    }

    /// Snapshot of every local candidate gathered so far.
    #[must_use]
    pub fn get_local_candidates_stats(&self) -> Vec<CandidateStats> {
        self.inner.lock().unwrap().local_candidates_stats()
    }

    /// Tears the session down (spec §5 "Cancellation"): cancels the armed
    /// timer and makes every subsequent call a no-op.
    pub fn destroy(&self) {
        self.inner.lock().unwrap().destroy();
    }
}
