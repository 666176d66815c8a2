use std::net::SocketAddr;

/// Non-blocking outbound datagram sink (spec §6 "Socket/timer
/// collaborators"). One instance per [`crate::component::Component`].
/// Datagram vs. stream socket type selection (spec §4.1's `socket_type`
/// argument) is the embedder's concern; this trait only names the
/// operation the core needs.
pub trait PacketSender {
    fn send_to(&self, data: &[u8], dst: SocketAddr);
}

/// Opaque handle to a scheduled timer entry, returned by
/// [`TimerDriver::schedule`] and accepted by [`TimerDriver::cancel`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// A timer heap supporting schedule/cancel (spec §6). The session holds at
/// most one armed entry at a time (spec §8 invariant: "Exactly one
/// periodic timer entry per session is armed at a time").
pub trait TimerDriver {
    fn schedule(&mut self, delay_ms: u64) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}
