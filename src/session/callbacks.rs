use std::net::SocketAddr;

use crate::error::Error;

/// The capability set a [`super::Session`] uses to reach its embedder (spec
/// §4.1, §9 "Dynamic dispatch for callbacks"). Collapsed from the original's
/// `On*HdlrFn` field-per-callback style to a single trait, matching how
/// `webrtc-ice`'s `Agent` exposes its handlers but as one object rather than
/// several independently-settable closures, since this core's callback set
/// is small and fixed.
///
/// Spec §4.1 also names `on_send_pkt(data, dst)`. This core has no separate
/// send callback: a [`crate::component::Component`] already owns the socket
/// it probes and receives on (spec §3 "Component"), so outbound bytes go
/// straight through [`crate::component::Component::send_to`] instead of
/// bouncing through the embedder a second time.
pub trait SessionCallbacks: Send {
    /// Non-STUN data received on `component_id`'s socket from `src` (e.g.
    /// media once the session is nominated). STUN traffic is consumed by
    /// the session itself and never reaches this callback.
    fn on_rx_data(&mut self, component_id: u16, data: &[u8], src: SocketAddr);

    /// Fired exactly once per session lifetime (spec §7 propagation
    /// policy), with `Ok(())` on overall success and `Err(_)` on overall
    /// failure (spec §4.8).
    fn on_ice_complete(&mut self, result: Result<(), Error>);
}
