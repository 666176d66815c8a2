use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr};

use log::{debug, trace, warn};
use stun::agent::TransactionId;
use stun::message::Message;

use super::{NominationPolicy, RemoteCandidateInput, SessionConfig};
use crate::auth::{Credentials, DynamicCredentials};
use crate::candidate::table::CandidateTable;
use crate::candidate::{Candidate, CandidateId, CandidateType, MAX_LOCAL_PREF};
use crate::check::list::CheckList;
use crate::check::pair_priority::pair_priority;
use crate::check::valid_list::ValidList;
use crate::check::{Check, CheckId, CheckState};
use crate::component::Component;
use crate::control::Role;
use crate::error::{Error, Result};
use crate::gather::{self, GatherCollaborator};
use crate::io::{PacketSender, TimerDriver, TimerHandle};
use crate::rand::generate_unique_foundation;
use crate::scheduler::{self, SchedulerAction};
use crate::session::callbacks::SessionCallbacks;
use crate::stats::{CandidatePairStats, CandidateStats};
use crate::stun_facade;

/// Bookkeeping for one outbound Binding request this session is waiting on
/// (spec §4.6). Correlating an inbound response to the `Check` that sent it
/// is this crate's own concern: matching the response's transaction id is
/// the one piece of "STUN transaction machinery" (spec §1 Non-goals) this
/// core cannot fully hand off, since without it the probe engine would have
/// no way to know which pair just completed. Retry/backoff scheduling stays
/// external — see [`super::Session::on_check_timeout`].
struct PendingProbe {
    check: CheckId,
    dst: SocketAddr,
    nominate: bool,
}

fn candidate_priority(table: &CandidateTable, id: CandidateId) -> u32 {
    table.get(id).map_or(0, |c| c.priority)
}

pub(crate) struct SessionInternal {
    config: SessionConfig,
    credentials: Option<Credentials>,
    components: Vec<Component>,
    local_table: CandidateTable,
    remote_table: CandidateTable,
    checklist: Option<CheckList>,
    valid_list: ValidList,
    gather: Box<dyn GatherCollaborator>,
    timer: Box<dyn TimerDriver>,
    armed_timer: Option<TimerHandle>,
    pending: HashMap<TransactionId, PendingProbe>,
    callbacks: Box<dyn SessionCallbacks>,
    completed: bool,
    renominated: HashSet<(CandidateId, CandidateId)>,
    closed: bool,
}

impl SessionInternal {
    pub(crate) fn new(
        config: SessionConfig,
        timer: Box<dyn TimerDriver>,
        gather: Box<dyn GatherCollaborator>,
        callbacks: Box<dyn SessionCallbacks>,
    ) -> Self {
        let max_candidates = config.max_candidates;
        Self {
            config,
            credentials: None,
            components: Vec::new(),
            local_table: CandidateTable::new(max_candidates),
            remote_table: CandidateTable::new(max_candidates),
            checklist: None,
            valid_list: ValidList::new(),
            gather,
            timer,
            armed_timer: None,
            pending: HashMap::new(),
            callbacks,
            completed: false,
            renominated: HashSet::new(),
            closed: false,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    pub(crate) fn add_component(&mut self, component_id: u16, local_bound_address: SocketAddr, socket: Box<dyn PacketSender>) -> Result<()> {
        self.check_open()?;
        crate::candidate::check_component_id(component_id)?;
        if self.components.iter().any(|c| c.component_id == component_id) {
            return Err(Error::InvalidArgument(format!("duplicate component_id {component_id}")));
        }
        self.components.push(Component::new(component_id, local_bound_address, socket));
        Ok(())
    }

    pub(crate) fn set_credentials(&mut self, local_ufrag: &str, local_pwd: &str, remote_ufrag: &str, remote_pwd: &str) -> Result<()> {
        self.check_open()?;
        self.credentials = Some(Credentials::new(local_ufrag, local_pwd, remote_ufrag, remote_pwd)?);
        Ok(())
    }

    pub(crate) fn start_gathering(&mut self, route_address: IpAddr) -> Result<()> {
        self.check_open()?;
        gather::gather_host(&self.components, &mut self.local_table, route_address)?;
        gather::gather_external(&self.components, &mut self.local_table, self.gather.as_mut())?;
        Ok(())
    }

    /// Stores the remote candidates and (re)builds the check list (spec
    /// §4.1: `add_remote_candidates` "both stores remotes and builds the
    /// check list"). Construction is a pure function of the current local
    /// and remote sets (spec §8 "Round-trip / idempotence laws"), so a
    /// second call simply recomputes the list from the now-larger remote
    /// set; any checks that had already started are recreated from
    /// scratch. Trickling additional remote candidates in after
    /// `start_checks` is out of scope (spec §1 treats signaling as
    /// external and this spec's Lifecycle names one check-list-building
    /// step).
    pub(crate) fn add_remote_candidates(&mut self, candidates: Vec<RemoteCandidateInput>) -> Result<()> {
        self.check_open()?;
        for input in candidates {
            crate::candidate::check_component_id(input.component_id)?;
            let candidate = Candidate {
                component_id: input.component_id,
                candidate_type: input.candidate_type,
                foundation: input.foundation,
                address: input.address,
                base_address: input.address,
                server_address: None,
                local_pref: 0,
                priority: input.priority,
                removed: false,
            };
            self.remote_table.add_candidate(candidate)?;
        }

        let list = CheckList::build(&self.local_table, &self.remote_table, self.config.role, self.config.max_checks)?;
        debug!("check list (re)built with {} checks", list.len());
        self.checklist = Some(list);
        Ok(())
    }

    pub(crate) fn start_checks(&mut self) -> Result<()> {
        self.check_open()?;
        let Some(list) = self.checklist.as_mut() else {
            return Err(Error::NoCheckList);
        };
        if list.is_empty() {
            return Err(Error::NoCheckList);
        }
        if list.state != crate::check::list::CheckListState::Idle {
            // start_checks is idempotent once Running (spec §4.1).
            return Ok(());
        }
        scheduler::seed_initial_waiting(list, &self.local_table);
        self.arm_timer();
        Ok(())
    }

    fn arm_timer(&mut self) {
        if self.armed_timer.is_none() {
            self.armed_timer = Some(self.timer.schedule(self.config.ta_millis));
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.armed_timer.take() {
            self.timer.cancel(handle);
        }
    }

    pub(crate) fn on_timer_tick(&mut self, handle: TimerHandle) {
        if self.closed || self.armed_timer != Some(handle) {
            trace!("ignoring stale or post-close timer tick");
            return;
        }
        self.armed_timer = None;

        let Some(list) = self.checklist.as_mut() else { return };
        match scheduler::tick(list) {
            SchedulerAction::Perform(id) => {
                self.perform_check(id);
                self.arm_timer();
            }
            SchedulerAction::Idle => self.arm_timer(),
            SchedulerAction::Completed => self.evaluate_overall_failure(),
        }
    }

    /// Invoked by the embedder's STUN retransmit logic when it gives up on
    /// `check_id`'s transaction without ever getting a response (spec §4.6
    /// "Failure (timeout ...)").
    pub(crate) fn on_check_timeout(&mut self, check_id: CheckId) {
        if self.closed {
            return;
        }
        self.pending.retain(|_, p| p.check != check_id);
        self.fail_check(check_id, Error::StunFailure { status: 408, reason: "timeout".into() });
    }

    /// Sends the Binding request for `id` (spec §4.6), transitioning it to
    /// `InProgress`. Grounded on the original's `perform_check`.
    fn perform_check(&mut self, id: CheckId) {
        let Some((local_id, remote_id, nominate_flag)) = self.checklist.as_mut().and_then(|list| {
            let check = list.get_mut(id)?;
            check.set_state(CheckState::InProgress, None);
            Some((check.local, check.remote, check.nominated))
        }) else {
            return;
        };

        let (Some(local), Some(remote)) = (self.local_table.get(local_id).cloned(), self.remote_table.get(remote_id).cloned()) else {
            self.fail_check(id, Error::InvalidArgument("check references a removed candidate".into()));
            return;
        };
        let Some(credentials) = self.credentials.clone() else {
            self.fail_check(id, Error::InvalidArgument("credentials not set".into()));
            return;
        };
        let Some(component) = self.components.iter().find(|c| c.component_id == local.component_id) else {
            self.fail_check(id, Error::InvalidArgument(format!("no component for id {}", local.component_id)));
            return;
        };

        let nominate = match self.config.nomination {
            NominationPolicy::Aggressive => self.config.role == Role::Controlling,
            NominationPolicy::Regular => nominate_flag,
        };
        let peer_reflexive_priority = Candidate::compute_priority(CandidateType::PeerReflexive, MAX_LOCAL_PREF, local.component_id);

        let message = match stun_facade::build_binding_request(peer_reflexive_priority, nominate, &credentials.tx.username, &credentials.tx.password) {
            Ok(m) => m,
            Err(e) => {
                warn!("failed to build binding request for check {id}: {e}");
                self.fail_check(id, e);
                return;
            }
        };

        let transaction_id = message.transaction_id;
        component.send_to(&message.raw, remote.address);
        self.pending.insert(transaction_id, PendingProbe { check: id, dst: remote.address, nominate });
    }

    fn fail_check(&mut self, id: CheckId, err: Error) {
        if let Some(list) = self.checklist.as_mut() {
            if let Some(check) = list.get_mut(id) {
                if check.state.is_terminal() {
                    return;
                }
                check.set_state(CheckState::Failed, Some(err));
            }
        }
        self.evaluate_overall_failure();
    }

    /// Single ingress point for bytes arriving on a component's socket
    /// (spec §4.1/§4.6/§4.7). Demultiplexes STUN traffic from application
    /// data the way the original's `on_rx_data`/`stun_on_rx_data` pairing
    /// does, then routes STUN messages by class.
    pub(crate) fn on_rx_packet(&mut self, component_id: u16, data: &[u8], src: SocketAddr) {
        if self.closed {
            return;
        }
        if !stun::message::is_message(data) {
            self.callbacks.on_rx_data(component_id, data, src);
            return;
        }

        let mut message = Message::new();
        if message.unmarshal_binary(data).is_err() {
            trace!("dropping malformed STUN-looking packet from {src}");
            return;
        }

        if message.typ.class == stun::message::CLASS_REQUEST {
            self.handle_inbound_request(component_id, &mut message, src);
        } else if stun_facade::is_success_response(&message) || message.typ.class == stun::message::CLASS_ERROR_RESPONSE {
            self.handle_inbound_response(&message, src);
        } else {
            trace!("dropping STUN indication/unused message class from {src}");
        }
    }

    /// Spec §4.7: authenticate, reply, derive the remote candidate, and run
    /// (or trigger) the matching check.
    fn handle_inbound_request(&mut self, component_id: u16, request: &mut Message, src: SocketAddr) {
        if !stun_facade::is_binding_request(request) {
            if let Ok(component) = self.find_component(component_id) {
                if let Ok(resp) = stun_facade::build_error_response(request, 400, "Bad Request") {
                    component.send_to(&resp.raw, src);
                }
            }
            return;
        }

        let Some(credentials) = &self.credentials else {
            trace!("dropping inbound request: no credentials configured yet");
            return;
        };
        let expected_username = credentials.rx.username.clone();
        if stun_facade::assert_username(request, &expected_username).is_err() {
            trace!("dropping inbound request from {src}: username mismatch (anti-amplification)");
            return;
        }
        if stun_facade::assert_message_integrity(request, credentials.rx.password.as_bytes()).is_err() {
            trace!("dropping inbound request from {src}: bad MESSAGE-INTEGRITY");
            return;
        }

        if self.remote_table.is_empty() {
            trace!("dropping inbound request: no remote candidates known yet (peer will retransmit)");
            return;
        }

        let rx_password = credentials.rx.password.clone();
        let Ok(response) = stun_facade::build_success_response(request, src, &rx_password) else {
            warn!("failed to build success response for inbound request from {src}");
            return;
        };
        let Ok(component) = self.find_component(component_id) else {
            warn!("inbound request on unknown component {component_id}");
            return;
        };
        component.send_to(&response.raw, src);

        let use_candidate = crate::use_candidate::UseCandidateAttr::is_set(request);
        let remote_id = match self.remote_table.find_by_address(component_id, src) {
            Some(id) => id,
            None => {
                let priority = stun_facade::extract_priority(request).unwrap_or(0);
                let foundation = generate_unique_foundation();
                let candidate = Candidate {
                    component_id,
                    candidate_type: CandidateType::PeerReflexive,
                    foundation,
                    address: src,
                    base_address: src,
                    server_address: None,
                    local_pref: 0,
                    priority,
                    removed: false,
                };
                match self.remote_table.add_candidate(candidate) {
                    Ok(id) => id,
                    Err(e) => {
                        warn!("could not add peer-reflexive remote candidate: {e}");
                        return;
                    }
                }
            }
        };

        let Some(local_id) = self.local_table.find_by_base_address(component_id, self.component_bound_address(component_id)) else {
            trace!("dropping inbound request: no local candidate bound for component {component_id}");
            return;
        };

        self.run_or_trigger_check(local_id, remote_id, use_candidate);
    }

    fn component_bound_address(&self, component_id: u16) -> SocketAddr {
        self.components
            .iter()
            .find(|c| c.component_id == component_id)
            .map_or_else(|| "0.0.0.0:0".parse().unwrap(), |c| c.local_bound_address)
    }

    fn find_component(&self, component_id: u16) -> Result<&Component> {
        self.components
            .iter()
            .find(|c| c.component_id == component_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown component {component_id}")))
    }

    /// Spec §4.7 step 7/8: find (or append) the pair for `(local, remote)`
    /// and either perform it immediately as a triggered check, or just
    /// update its nomination flag if it is already settled.
    fn run_or_trigger_check(&mut self, local_id: CandidateId, remote_id: CandidateId, use_candidate: bool) {
        let Some(list) = self.checklist.as_mut() else { return };

        if let Some(existing) = list.find(local_id, remote_id) {
            let Some(check) = list.get_mut(existing) else { return };
            match check.state {
                CheckState::Frozen | CheckState::Waiting => {
                    check.nominated = use_candidate;
                    check.state = CheckState::Waiting;
                    drop(list);
                    self.perform_check(existing);
                }
                CheckState::InProgress => {
                    // Retransmit policy is the STUN layer's concern (spec §4.7 step 7).
                    check.nominated = use_candidate;
                }
                CheckState::Succeeded => {
                    if use_candidate {
                        check.nominated = true;
                    }
                    drop(list);
                    self.evaluate_completion(existing);
                }
                CheckState::Failed => {}
            }
            return;
        }

        let local_priority = candidate_priority(&self.local_table, local_id);
        let remote_priority = candidate_priority(&self.remote_table, remote_id);
        let priority = pair_priority(self.config.role, local_priority, remote_priority);
        match list.append_triggered(local_id, remote_id, priority, use_candidate) {
            Ok(new_id) => {
                drop(list);
                self.perform_check(new_id);
            }
            Err(e) => {
                debug!("dropping triggered check: {e}");
            }
        }
    }

    /// Spec §4.6: interprets the response to a probe we sent.
    fn handle_inbound_response(&mut self, message: &Message, src: SocketAddr) {
        let Some(pending) = self.pending.remove(&message.transaction_id) else {
            trace!("dropping STUN response with unknown transaction id from {src}");
            return;
        };
        let id = pending.check;

        if message.typ.class == stun::message::CLASS_ERROR_RESPONSE {
            self.fail_check(id, Error::StunFailure { status: 500, reason: "error response".into() });
            return;
        }
        if pending.dst != src {
            self.fail_check(id, Error::SourceAddressMismatch);
            return;
        }

        let mapped = match stun_facade::extract_xor_mapped_address(message) {
            Ok(addr) => addr,
            Err(_) => {
                self.fail_check(id, Error::NoXorMappedAddress);
                return;
            }
        };

        let Some((local_id, component_id)) = self.checklist.as_ref().and_then(|l| l.get(id)).and_then(|c| self.local_table.get(c.local).map(|l| (c.local, l.component_id))) else {
            return;
        };

        let effective_local = if self.local_table.find_by_address(component_id, mapped).is_some() {
            self.local_table.find_by_address(component_id, mapped).unwrap()
        } else {
            let base = self.local_table.get(local_id).map_or(mapped, |l| l.base_address);
            let candidate = Candidate::new(component_id, CandidateType::PeerReflexive, CandidateType::PeerReflexive.foundation_class().to_string(), mapped, base, None, MAX_LOCAL_PREF);
            match self.local_table.add_candidate(candidate) {
                Ok(new_id) => new_id,
                Err(e) => {
                    self.fail_check(id, e);
                    return;
                }
            }
        };

        if let Some(list) = self.checklist.as_mut() {
            if let Some(check) = list.get_mut(id) {
                check.local = effective_local;
                check.nominated = pending.nominate;
                check.set_state(CheckState::Succeeded, None);
            }
        }

        if let Some(list) = self.checklist.as_ref() {
            self.valid_list.insert(id, list);
        }
        self.evaluate_completion(id);
    }

    /// Spec §4.8. Runs after every check transition to `Succeeded` (probe
    /// success, or an inbound `USE-CANDIDATE` landing on an
    /// already-succeeded pair).
    fn evaluate_completion(&mut self, succeeded: CheckId) {
        self.unfreeze_same_foundation(succeeded);

        let component_id = self
            .checklist
            .as_ref()
            .and_then(|l| l.get(succeeded))
            .and_then(|c| self.local_table.get(c.local))
            .map(|l| l.component_id);

        if let Some(component_id) = component_id {
            if self
                .checklist
                .as_ref()
                .map(|l| self.valid_list.has_nominated_for_component(l, &self.local_table, component_id))
                .unwrap_or(false)
            {
                self.cancel_non_nominated_for_component(component_id);
            } else {
                self.maybe_trigger_regular_nomination(component_id);
            }
        }

        self.evaluate_overall_completion();
    }

    /// Unfreezes every `Frozen` check sharing the succeeded check's
    /// foundation but not its component (spec §4.8 "Unfreezing").
    fn unfreeze_same_foundation(&mut self, succeeded: CheckId) {
        let Some((foundation, component_id)) = self.checklist.as_ref().and_then(|l| l.get(succeeded)).and_then(|c| self.local_table.get(c.local)).map(|l| (l.foundation.clone(), l.component_id)) else {
            return;
        };

        let Some(list) = self.checklist.as_mut() else { return };
        let ids: Vec<CheckId> = list.iter().map(|(id, _)| id).collect();
        let mut any_unfrozen = false;
        for id in ids {
            let Some(check) = list.get(id) else { continue };
            if check.state != CheckState::Frozen {
                continue;
            }
            let Some(local) = self.local_table.get(check.local) else { continue };
            if local.component_id == component_id || local.foundation != foundation {
                continue;
            }
            if let Some(check) = list.get_mut(id) {
                check.state = CheckState::Waiting;
                any_unfrozen = true;
            }
        }
        if any_unfrozen {
            self.arm_timer();
        }
    }

    /// Spec §4.8 "Per-component nomination": once `component_id` has a
    /// nominated `Succeeded` pair, every still-`Frozen`/`Waiting` check for
    /// it is cancelled. `InProgress` checks are left for the STUN layer to
    /// stop retransmitting on its own (spec §4.8's "SHOULD cease
    /// retransmissions", deferred like any other retransmit decision).
    fn cancel_non_nominated_for_component(&mut self, component_id: u16) {
        let Some(list) = self.checklist.as_mut() else { return };
        let ids: Vec<CheckId> = list.iter().map(|(id, _)| id).collect();
        for id in ids {
            let Some(check) = list.get(id) else { continue };
            if !matches!(check.state, CheckState::Frozen | CheckState::Waiting) {
                continue;
            }
            let Some(local) = self.local_table.get(check.local) else { continue };
            if local.component_id != component_id {
                continue;
            }
            if let Some(check) = list.get_mut(id) {
                check.set_state(CheckState::Failed, Some(Error::Cancelled));
            }
        }
    }

    /// Implements regular nomination (spec §9 Open Question, resolved per
    /// `SPEC_FULL.md` §13): once every check for `component_id` is
    /// terminal and at least one succeeded, enqueue a triggered re-probe
    /// on the highest-priority `Succeeded` pair with `USE-CANDIDATE` set.
    /// Guarded by `renominated` so a pair is only ever renominated once.
    fn maybe_trigger_regular_nomination(&mut self, component_id: u16) {
        if self.config.nomination != NominationPolicy::Regular || self.config.role != Role::Controlling {
            return;
        }
        let Some(list) = self.checklist.as_ref() else { return };

        let all_terminal_for_component = list
            .iter()
            .filter(|(_, c)| self.local_table.get(c.local).map(|l| l.component_id) == Some(component_id))
            .all(|(_, c)| c.state.is_terminal());
        if !all_terminal_for_component {
            return;
        }

        let best = self
            .valid_list
            .iter()
            .filter(|&id| list.get(id).and_then(|c| self.local_table.get(c.local)).map(|l| l.component_id) == Some(component_id))
            .max_by_key(|&id| list.get(id).map_or(0, |c| c.priority));

        let Some(best_id) = best else { return };
        let Some(check) = list.get(best_id) else { return };
        let (local, remote, priority) = (check.local, check.remote, check.priority);
        if !self.renominated.insert((local, remote)) {
            return;
        }

        let Some(list) = self.checklist.as_mut() else { return };
        match list.append_triggered(local, remote, priority, true) {
            Ok(new_id) => {
                debug!("scheduling regular-nomination re-probe for component {component_id}");
                drop(list);
                self.arm_timer();
                let _ = new_id;
            }
            Err(e) => debug!("could not enqueue nomination re-probe: {e}"),
        }
    }

    /// Spec §4.8 "Overall success"/"Overall failure". Fires
    /// `on_ice_complete` exactly once (spec §7).
    fn evaluate_overall_completion(&mut self) {
        if self.completed {
            return;
        }
        let Some(list) = self.checklist.as_ref() else { return };

        let components: HashSet<u16> = self.local_table.iter().map(|(_, c)| c.component_id).collect();
        if components.is_empty() {
            return;
        }
        let all_nominated = components.iter().all(|&c| self.valid_list.has_nominated_for_component(list, &self.local_table, c));
        if all_nominated {
            self.completed = true;
            self.cancel_timer();
            self.callbacks.on_ice_complete(Ok(()));
        }
    }

    /// Only the controlling side ever calls overall failure on its own:
    /// nomination is its decision to make, so a controlled agent whose
    /// checklist finished without a nominated pair is still correctly
    /// waiting on a USE-CANDIDATE that may yet arrive and flip an
    /// already-`Succeeded` check's `nominated` flag in place (spec §4.7
    /// step 7). Declaring failure here for a controlled agent would be
    /// premature; it has no equivalent to "I exhausted my own checklist"
    /// since it never nominates.
    fn evaluate_overall_failure(&mut self) {
        if self.completed || self.config.role != Role::Controlling {
            return;
        }
        let Some(list) = self.checklist.as_ref() else { return };
        if !list.all_terminal() {
            return;
        }
        self.evaluate_overall_completion();
        if self.completed {
            return;
        }
        self.completed = true;
        self.cancel_timer();
        self.callbacks.on_ice_complete(Err(Error::StunFailure {
            status: 408,
            reason: "check list exhausted without a nominated pair for every component".into(),
        }));
    }

    pub(crate) fn candidate_pairs_stats(&self) -> Vec<CandidatePairStats> {
        let Some(list) = self.checklist.as_ref() else { return Vec::new() };
        list.iter()
            .filter_map(|(_, check)| {
                let local = self.local_table.get(check.local)?;
                let remote = self.remote_table.get(check.remote)?;
                Some(CandidatePairStats {
                    local_candidate: local.address,
                    remote_candidate: remote.address,
                    state: check.state,
                    nominated: check.nominated,
                    priority: check.priority,
                })
            })
            .collect()
    }

    pub(crate) fn local_candidates_stats(&self) -> Vec<CandidateStats> {
        self.local_table
            .iter()
            .map(|(_, c)| CandidateStats {
                candidate_type: c.candidate_type,
                address: c.address,
                priority: c.priority,
            })
            .collect()
    }

    /// Spec §5 Cancellation: timer, then component STUN sessions (dropped
    /// along with `components`), then marks the session closed.
    pub(crate) fn destroy(&mut self) {
        if self.closed {
            return;
        }
        self.cancel_timer();
        self.pending.clear();
        self.closed = true;
    }
}
