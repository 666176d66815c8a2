#[cfg(test)]
mod auth_test;

use crate::error::{Error, Result};

/// Bound on the ufrag/ufrag username string spec §6 names as
/// `CHECK_NAME_LEN` (128): both the `tx` and `rx` usernames are a
/// colon-joined pair of ufrags, so each ufrag half is bounded loosely by
/// this same constant.
pub const CHECK_NAME_LEN: usize = 128;

/// One ufrag/password pair used to sign and verify STUN messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UfragPwd {
    pub username: String,
    pub password: String,
}

/// The two credential pairs a session derives from its local/remote
/// ufrag/password (spec §3 "Credentials"). Grounded on the original's
/// `pj_ice_set_credentials`: `tx` signs/authenticates outbound probes with
/// the *remote* password; `rx` authenticates inbound probes with the
/// *local* password. The username halves are ordered oppositely
/// (`remote:local` for `tx`, `local:remote` for `rx`) so that this agent's
/// `tx` username is exactly the peer's expected `rx` username, and vice
/// versa — the only ordering that lets the two sides interoperate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tx: UfragPwd,
    pub rx: UfragPwd,
}

impl Credentials {
    pub fn new(local_ufrag: &str, local_pwd: &str, remote_ufrag: &str, remote_pwd: &str) -> Result<Self> {
        if local_ufrag.len() + remote_ufrag.len() >= CHECK_NAME_LEN {
            return Err(Error::NameTooLong);
        }

        Ok(Self {
            tx: UfragPwd {
                username: format!("{remote_ufrag}:{local_ufrag}"),
                password: remote_pwd.to_string(),
            },
            rx: UfragPwd {
                username: format!("{local_ufrag}:{remote_ufrag}"),
                password: local_pwd.to_string(),
            },
        })
    }
}

/// The dynamic-credential adapter the session hands to its STUN
/// sub-sessions (spec §6). No NONCE is used: `get_realm_nonce` always
/// returns empty, `verify_nonce` always succeeds.
pub trait DynamicCredentials {
    /// Credential to attach to an outgoing message: `tx.*` for requests,
    /// `rx.*` for responses (spec §6; a response must carry the credential
    /// of the request it answers).
    fn get_outgoing_cred(&self, is_response: bool) -> UfragPwd;

    /// Password to verify an incoming message with: for a response, `tx`'s
    /// password after confirming the username equals `tx.username`; for a
    /// request, `rx`'s password unconditionally.
    fn get_password_for_incoming(&self, is_response: bool, username: &str) -> Option<String>;

    fn get_realm_nonce(&self) -> (String, String) {
        (String::new(), String::new())
    }

    fn verify_nonce(&self, _username: &str, _nonce: &str) -> bool {
        true
    }
}

impl DynamicCredentials for Credentials {
    fn get_outgoing_cred(&self, is_response: bool) -> UfragPwd {
        if is_response {
            self.rx.clone()
        } else {
            self.tx.clone()
        }
    }

    fn get_password_for_incoming(&self, is_response: bool, username: &str) -> Option<String> {
        if is_response {
            if username == self.tx.username {
                Some(self.tx.password.clone())
            } else {
                None
            }
        } else {
            Some(self.rx.password.clone())
        }
    }
}
