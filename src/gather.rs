#[cfg(test)]
mod gather_test;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::candidate::{Candidate, CandidateId, CandidateType, MAX_LOCAL_PREF};
use crate::candidate::table::CandidateTable;
use crate::component::Component;
use crate::error::Result;

/// External collaborator for reflexive/relayed discovery (spec §4.2:
/// "Reflexive/relayed gathering is requested from external collaborators").
/// The STUN-server round trip and TURN allocation this implies are out of
/// scope (spec §1); a discovered address simply arrives through this trait
/// however the embedder obtains it.
pub trait GatherCollaborator {
    /// Server-reflexive addresses observed for `component_id`, paired with
    /// the base address (the local socket) each was observed from.
    fn gather_reflexive(&mut self, component_id: u16, base: SocketAddr) -> Vec<SocketAddr>;

    /// Relayed addresses allocated for `component_id`.
    fn gather_relayed(&mut self, component_id: u16) -> Vec<SocketAddr>;
}

/// A collaborator that discovers nothing; sessions that only need host
/// candidates use this.
#[derive(Default)]
pub struct NoGathering;

impl GatherCollaborator for NoGathering {
    fn gather_reflexive(&mut self, _component_id: u16, _base: SocketAddr) -> Vec<SocketAddr> {
        Vec::new()
    }

    fn gather_relayed(&mut self, _component_id: u16) -> Vec<SocketAddr> {
        Vec::new()
    }
}

fn is_wildcard(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4 == Ipv4Addr::UNSPECIFIED,
        IpAddr::V6(v6) => v6 == Ipv6Addr::UNSPECIFIED,
    }
}

/// Host-candidate gathering (spec §4.2). For each component, reads the
/// bound socket address; if wildcard, substitutes `route_address` (the
/// embedder's notion of "the" host route, since this crate has no socket
/// layer of its own — grounded on the original's `pj_gethostip` call in
/// `gather_host_cands`). Installs a Host candidate at `local_pref =
/// MAX_LOCAL_PREF` and lets the table's redundancy elimination run.
pub fn gather_host(components: &[Component], local_table: &mut CandidateTable, route_address: IpAddr) -> Result<Vec<CandidateId>> {
    let mut ids = Vec::with_capacity(components.len());
    for component in components {
        let mut addr = component.local_bound_address;
        if is_wildcard(addr.ip()) {
            addr = SocketAddr::new(route_address, addr.port());
        }
        let candidate = Candidate::new(component.component_id, CandidateType::Host, "host".to_string(), addr, addr, None, MAX_LOCAL_PREF);
        ids.push(local_table.add_candidate(candidate)?);
    }
    Ok(ids)
}

/// Delegates reflexive/relayed discovery to `collaborator` and installs
/// whatever it finds (spec §4.2's second half). Each is added with the
/// foundation class spec §3 assigns to its type and `local_pref =
/// MAX_LOCAL_PREF` (a single server/relay per component in this crate;
/// differentiating multiple would need a lower `local_pref` per the
/// original's ranking scheme, which is out of scope here).
pub fn gather_external(
    components: &[Component],
    local_table: &mut CandidateTable,
    collaborator: &mut dyn GatherCollaborator,
) -> Result<Vec<CandidateId>> {
    let mut ids = Vec::new();
    for component in components {
        let base = component.local_bound_address;
        for addr in collaborator.gather_reflexive(component.component_id, base) {
            let candidate = Candidate::new(
                component.component_id,
                CandidateType::ServerReflexive,
                CandidateType::ServerReflexive.foundation_class().to_string(),
                addr,
                base,
                Some(addr),
                MAX_LOCAL_PREF,
            );
            ids.push(local_table.add_candidate(candidate)?);
        }
        for addr in collaborator.gather_relayed(component.component_id) {
            let candidate = Candidate::new(
                component.component_id,
                CandidateType::Relayed,
                CandidateType::Relayed.foundation_class().to_string(),
                addr,
                addr,
                Some(addr),
                MAX_LOCAL_PREF,
            );
            ids.push(local_table.add_candidate(candidate)?);
        }
    }
    Ok(ids)
}
