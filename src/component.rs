#[cfg(test)]
mod component_test;

use std::net::SocketAddr;

use crate::io::PacketSender;

/// One media-stream sub-flow (spec §3 "Component", e.g. RTP=1, RTCP=2).
/// Created by the application and handed to [`crate::session::Session`] via
/// `add_component`; owns the bound socket used to send and receive STUN
/// probes for this component. Grounded on the original's
/// `pj_ice_add_sock_comp`, minus the STUN-session bookkeeping it performs
/// there: this crate's STUN message construction (`crate::stun_facade`) is
/// stateless, so a component is just an address and a sink.
pub struct Component {
    pub component_id: u16,
    pub local_bound_address: SocketAddr,
    socket: Box<dyn PacketSender>,
}

impl Component {
    #[must_use]
    pub fn new(component_id: u16, local_bound_address: SocketAddr, socket: Box<dyn PacketSender>) -> Self {
        Self {
            component_id,
            local_bound_address,
            socket,
        }
    }

    pub fn send_to(&self, data: &[u8], dst: SocketAddr) {
        self.socket.send_to(data, dst);
    }
}
