use std::cell::RefCell;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::rc::Rc;
use std::sync::{Arc, Mutex as StdMutex};

use super::*;
use crate::candidate::MAX_LOCAL_PREF;
use crate::gather::NoGathering;

#[derive(Default)]
struct ManualTimer;

impl TimerDriver for ManualTimer {
    fn schedule(&mut self, _delay_ms: u64) -> TimerHandle {
        TimerHandle(1)
    }

    fn cancel(&mut self, _handle: TimerHandle) {}
}

/// Queues outbound bytes instead of delivering them synchronously, so a
/// test can drive two sessions that talk to each other without either
/// session's `Mutex` being re-entered mid-call.
type Mailbox = Rc<RefCell<VecDeque<(&'static str, u16, Vec<u8>, SocketAddr)>>>;

struct QueuingSender {
    dest: &'static str,
    component_id: u16,
    src: SocketAddr,
    mailbox: Mailbox,
}

impl PacketSender for QueuingSender {
    fn send_to(&self, data: &[u8], _dst: SocketAddr) {
        self.mailbox.borrow_mut().push_back((self.dest, self.component_id, data.to_vec(), self.src));
    }
}

fn drain(mailbox: &Mailbox, a: &Session, b: &Session) {
    loop {
        let next = mailbox.borrow_mut().pop_front();
        let Some((dest, component_id, data, src)) = next else { break };
        match dest {
            "a" => a.on_rx_packet(component_id, &data, src),
            "b" => b.on_rx_packet(component_id, &data, src),
            _ => unreachable!(),
        }
    }
}

#[derive(Clone, Default)]
struct RecordingCallbacks {
    result: Arc<StdMutex<Option<std::result::Result<(), crate::error::Error>>>>,
}

impl SessionCallbacks for RecordingCallbacks {
    fn on_rx_data(&mut self, _component_id: u16, _data: &[u8], _src: SocketAddr) {}

    fn on_ice_complete(&mut self, result: std::result::Result<(), crate::error::Error>) {
        *self.result.lock().unwrap() = Some(result);
    }
}

#[test]
fn test_two_host_only_sessions_complete_with_a_nominated_pair() {
    let addr_a: SocketAddr = "127.0.0.1:5000".parse().unwrap();
    let addr_b: SocketAddr = "127.0.0.1:6000".parse().unwrap();
    let host_priority = crate::candidate::Candidate::compute_priority(CandidateType::Host, MAX_LOCAL_PREF, 1);

    let mailbox: Mailbox = Rc::new(RefCell::new(VecDeque::new()));

    let callbacks_a = RecordingCallbacks::default();
    let result_a = callbacks_a.result.clone();
    let callbacks_b = RecordingCallbacks::default();
    let result_b = callbacks_b.result.clone();

    let session_a = Session::create(
        SessionConfig::new(Role::Controlling),
        Box::new(ManualTimer),
        Box::new(NoGathering),
        Box::new(callbacks_a),
    );
    let session_b = Session::create(
        SessionConfig::new(Role::Controlled),
        Box::new(ManualTimer),
        Box::new(NoGathering),
        Box::new(callbacks_b),
    );

    session_a
        .add_component(
            1,
            addr_a,
            Box::new(QueuingSender { dest: "b", component_id: 1, src: addr_a, mailbox: mailbox.clone() }),
        )
        .unwrap();
    session_b
        .add_component(
            1,
            addr_b,
            Box::new(QueuingSender { dest: "a", component_id: 1, src: addr_b, mailbox: mailbox.clone() }),
        )
        .unwrap();

    session_a.set_credentials("uA", "pwdA00000000000000000000", "uB", "pwdB00000000000000000000").unwrap();
    session_b.set_credentials("uB", "pwdB00000000000000000000", "uA", "pwdA00000000000000000000").unwrap();

    session_a.start_gathering(addr_a.ip()).unwrap();
    session_b.start_gathering(addr_b.ip()).unwrap();

    session_a
        .add_remote_candidates(vec![RemoteCandidateInput {
            component_id: 1,
            candidate_type: CandidateType::Host,
            foundation: "host".into(),
            address: addr_b,
            priority: host_priority,
        }])
        .unwrap();
    session_b
        .add_remote_candidates(vec![RemoteCandidateInput {
            component_id: 1,
            candidate_type: CandidateType::Host,
            foundation: "host".into(),
            address: addr_a,
            priority: host_priority,
        }])
        .unwrap();

    session_a.start_checks().unwrap();
    session_b.start_checks().unwrap();

    for _ in 0..50 {
        if result_a.lock().unwrap().is_some() && result_b.lock().unwrap().is_some() {
            break;
        }
        session_a.on_timer_tick(TimerHandle(1));
        drain(&mailbox, &session_a, &session_b);
        session_b.on_timer_tick(TimerHandle(1));
        drain(&mailbox, &session_a, &session_b);
    }

    assert_eq!(*result_a.lock().unwrap(), Some(Ok(())));
    assert_eq!(*result_b.lock().unwrap(), Some(Ok(())));

    let pairs_a = session_a.get_candidate_pairs_stats();
    assert!(pairs_a.iter().any(|p| p.nominated && p.state == crate::check::CheckState::Succeeded));
}

#[test]
fn test_add_remote_candidates_enforces_max_candidates() {
    let mut config = SessionConfig::new(Role::Controlling);
    config.max_candidates = 1;
    let session = Session::create(config, Box::new(ManualTimer), Box::new(NoGathering), Box::new(RecordingCallbacks::default()));

    let first = RemoteCandidateInput {
        component_id: 1,
        candidate_type: CandidateType::Host,
        foundation: "host".into(),
        address: "127.0.0.1:7000".parse().unwrap(),
        priority: 100,
    };
    let second = RemoteCandidateInput {
        component_id: 1,
        candidate_type: CandidateType::Host,
        foundation: "host".into(),
        address: "127.0.0.1:7001".parse().unwrap(),
        priority: 100,
    };

    session.add_remote_candidates(vec![first]).unwrap();
    let err = session.add_remote_candidates(vec![second]).unwrap_err();
    assert_eq!(err, crate::error::Error::TooManyCandidates);
}

#[test]
fn test_add_component_rejects_duplicate_component_id() {
    let session = Session::create(
        SessionConfig::new(Role::Controlling),
        Box::new(ManualTimer),
        Box::new(NoGathering),
        Box::new(RecordingCallbacks::default()),
    );
    let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
    let mailbox: Mailbox = Rc::new(RefCell::new(VecDeque::new()));
    session
        .add_component(1, addr, Box::new(QueuingSender { dest: "a", component_id: 1, src: addr, mailbox: mailbox.clone() }))
        .unwrap();

    let err = session
        .add_component(1, addr, Box::new(QueuingSender { dest: "a", component_id: 1, src: addr, mailbox }))
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::InvalidArgument(_)));
}

#[test]
fn test_non_binding_request_gets_400_response() {
    use stun::agent::TransactionId;
    use stun::message::{Message, MessageType, Setter, CLASS_ERROR_RESPONSE, CLASS_REQUEST, METHOD_ALLOCATE};

    let addr: SocketAddr = "127.0.0.1:5000".parse().unwrap();
    let peer: SocketAddr = "127.0.0.1:6000".parse().unwrap();
    let mailbox: Mailbox = Rc::new(RefCell::new(VecDeque::new()));

    let session = Session::create(
        SessionConfig::new(Role::Controlled),
        Box::new(ManualTimer),
        Box::new(NoGathering),
        Box::new(RecordingCallbacks::default()),
    );
    session
        .add_component(1, addr, Box::new(QueuingSender { dest: "a", component_id: 1, src: addr, mailbox: mailbox.clone() }))
        .unwrap();
    session.set_credentials("uA", "pwdA00000000000000000000", "uB", "pwdB00000000000000000000").unwrap();

    let mut request = Message::new();
    request
        .build(&[
            Box::new(MessageType { method: METHOD_ALLOCATE, class: CLASS_REQUEST }),
            Box::new(TransactionId::new()),
        ])
        .unwrap();

    session.on_rx_packet(1, &request.raw, peer);

    let (dest, component_id, data, _src) = mailbox.borrow_mut().pop_front().expect("a 400 response was queued");
    assert_eq!(dest, "a");
    assert_eq!(component_id, 1);

    let mut response = Message::new();
    response.unmarshal_binary(&data).unwrap();
    assert_eq!(response.typ.class, CLASS_ERROR_RESPONSE);
    assert_eq!(response.transaction_id, request.transaction_id);
}

#[test]
fn test_destroyed_session_rejects_start_checks() {
    let session = Session::create(
        SessionConfig::new(Role::Controlling),
        Box::new(ManualTimer),
        Box::new(NoGathering),
        Box::new(RecordingCallbacks::default()),
    );
    session.destroy();
    assert_eq!(session.start_checks().unwrap_err(), crate::error::Error::Closed);
}
