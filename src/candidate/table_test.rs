use super::*;

fn addr(s: &str) -> std::net::SocketAddr {
    s.parse().unwrap()
}

fn host(port: u16, local_pref: u32) -> Candidate {
    Candidate::new(1, CandidateType::Host, "host", addr(&format!("10.0.0.1:{port}")), addr(&format!("10.0.0.1:{port}")), None, local_pref)
}

#[test]
fn test_add_candidate_assigns_stable_ids() {
    let mut table = CandidateTable::new(10);
    let id0 = table.add_candidate(host(5000, 65535)).unwrap();
    let id1 = table.add_candidate(host(5001, 65535)).unwrap();
    assert_ne!(id0, id1);
    assert_eq!(table.len(), 2);
}

#[test]
fn test_redundant_candidate_collapses_to_one() {
    let mut table = CandidateTable::new(10);
    let host_id = table.add_candidate(host(5000, 65535)).unwrap();
    // A server-reflexive candidate redundant with the host at the same
    // (address, base_address) but lower priority is dropped silently.
    let srflx = Candidate::new(1, CandidateType::ServerReflexive, "srfx", addr("10.0.0.1:5000"), addr("10.0.0.1:5000"), None, 100);
    let collapsed_id = table.add_candidate(srflx).unwrap();
    assert_eq!(collapsed_id, host_id);
    assert_eq!(table.len(), 1);
}

#[test]
fn test_too_many_candidates_at_exact_boundary() {
    let mut table = CandidateTable::new(2);
    table.add_candidate(host(5000, 65535)).unwrap();
    table.add_candidate(host(5001, 65535)).unwrap();
    let result = table.add_candidate(host(5002, 65535));
    assert_eq!(result, Err(Error::TooManyCandidates));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_find_by_address() {
    let mut table = CandidateTable::new(10);
    let id = table.add_candidate(host(5000, 65535)).unwrap();
    assert_eq!(table.find_by_address(1, addr("10.0.0.1:5000")), Some(id));
    assert_eq!(table.find_by_address(1, addr("10.0.0.1:5999")), None);
}
