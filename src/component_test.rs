use std::cell::RefCell;
use std::net::SocketAddr;
use std::rc::Rc;

use super::*;

#[derive(Default)]
struct RecordingSender {
    sent: Rc<RefCell<Vec<(Vec<u8>, SocketAddr)>>>,
}

impl PacketSender for RecordingSender {
    fn send_to(&self, data: &[u8], dst: SocketAddr) {
        self.sent.borrow_mut().push((data.to_vec(), dst));
    }
}

#[test]
fn test_send_to_forwards_to_socket() {
    let sent = Rc::new(RefCell::new(Vec::new()));
    let sender = RecordingSender { sent: sent.clone() };
    let local: SocketAddr = "127.0.0.1:9000".parse().unwrap();
    let component = Component::new(1, local, Box::new(sender));

    let dst: SocketAddr = "127.0.0.1:9001".parse().unwrap();
    component.send_to(b"hello", dst);

    assert_eq!(component.component_id, 1);
    assert_eq!(component.local_bound_address, local);
    assert_eq!(sent.borrow().len(), 1);
    assert_eq!(sent.borrow()[0].0, b"hello");
    assert_eq!(sent.borrow()[0].1, dst);
}
