use super::*;
use crate::candidate::{Candidate, CandidateId, CandidateType};
use crate::check::Check;

fn addr(s: &str) -> std::net::SocketAddr {
    s.parse().unwrap()
}

fn succeeded_check(local: CandidateId, remote: CandidateId, priority: u64, nominated: bool) -> Check {
    let mut c = Check::new(local, remote, priority);
    c.state = CheckState::Succeeded;
    c.nominated = nominated;
    c
}

#[test]
fn test_insert_sorts_descending_by_priority() {
    let mut local = CandidateTable::new(10);
    let mut remote = CandidateTable::new(10);
    let l0 = local.add_candidate(Candidate::new(1, CandidateType::Host, "host", addr("10.0.0.1:5000"), addr("10.0.0.1:5000"), None, 65535)).unwrap();
    let r0 = remote.add_candidate(Candidate::new(1, CandidateType::Host, "host", addr("10.0.0.2:5000"), addr("10.0.0.2:5000"), None, 65535)).unwrap();

    let mut checklist = CheckList::new(100);
    let low = checklist.append_triggered(l0, r0, 10, false).unwrap();
    let high = checklist.append_triggered(l0, r0, 99, false).unwrap();
    checklist.get_mut(low).unwrap().state = CheckState::Succeeded;
    checklist.get_mut(high).unwrap().state = CheckState::Succeeded;

    let mut valid = ValidList::new();
    valid.insert(low, &checklist);
    valid.insert(high, &checklist);

    let ordered: Vec<CheckId> = valid.iter().collect();
    assert_eq!(ordered, vec![high, low]);
}

#[test]
fn test_has_nominated_for_component() {
    let mut local = CandidateTable::new(10);
    let mut remote = CandidateTable::new(10);
    let l0 = local.add_candidate(Candidate::new(1, CandidateType::Host, "host", addr("10.0.0.1:5000"), addr("10.0.0.1:5000"), None, 65535)).unwrap();
    let r0 = remote.add_candidate(Candidate::new(1, CandidateType::Host, "host", addr("10.0.0.2:5000"), addr("10.0.0.2:5000"), None, 65535)).unwrap();

    let mut checklist = CheckList::new(100);
    let id = checklist.append_triggered(l0, r0, 10, true).unwrap();
    checklist.get_mut(id).unwrap().state = CheckState::Succeeded;

    let mut valid = ValidList::new();
    valid.insert(id, &checklist);

    assert!(valid.has_nominated_for_component(&checklist, &local, 1));
    assert!(!valid.has_nominated_for_component(&checklist, &local, 2));
}
