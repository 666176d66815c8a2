use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the application embedding a [`crate::session::Session`].
///
/// Construction-time errors (malformed arguments, capacity exceeded) fail the
/// originating call synchronously. Per-check failures are carried in
/// [`crate::check::Check::err_code`] instead of being returned here; they never
/// abort the session.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied argument violates a documented precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Adding a candidate would exceed `MAX_CANDIDATES` for its side.
    #[error("too many candidates")]
    TooManyCandidates,

    /// Check-list construction produced more pairs than `MAX_CHECKS`.
    #[error("too many checks")]
    TooManyChecks,

    /// `start_checks` was called before a check list exists (no remote
    /// candidates have been added, or the list is empty).
    #[error("no check list")]
    NoCheckList,

    /// A ufrag/credential string exceeds `CHECK_NAME_LEN`.
    #[error("name too long")]
    NameTooLong,

    /// A gather/resolve query is already outstanding.
    #[error("busy")]
    Busy,

    /// The requested feature is not implemented by this core.
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    /// The session has already been destroyed.
    #[error("session is closed")]
    Closed,

    /// A STUN transaction terminated with a non-success status. Carried into
    /// `Check::err_code`; never returned from a public `Session` method.
    #[error("STUN transaction failed: {reason}")]
    StunFailure { status: u16, reason: String },

    /// A connectivity check was cancelled because its component already has
    /// a nominated pair (spec §4.8).
    #[error("check cancelled")]
    Cancelled,

    /// The Binding success response carried no XOR-MAPPED-ADDRESS.
    #[error("no XOR-MAPPED-ADDRESS in response")]
    NoXorMappedAddress,

    /// The response source address did not match the request destination.
    #[error("response source address mismatch")]
    SourceAddressMismatch,
}
