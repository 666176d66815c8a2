
use std::fmt;

/// The role a session plays in nomination and pair-priority ordering.
///
/// A session does not negotiate its role over the wire (no ICE-CONTROLLED/
/// ICE-CONTROLLING tie-breaker exchange) — the role is fixed at `create`
/// and drives which side of the pair priority formula a session occupies
/// and whether it attaches USE-CANDIDATE to outgoing probes.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Role {
    Controlling,
    Controlled,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Controlling => "controlling",
            Self::Controlled => "controlled",
        };
        write!(f, "{s}")
    }
}
