#[cfg(test)]
mod stun_facade_test;

use std::net::SocketAddr;

use stun::agent::TransactionId;
use stun::attributes::ATTR_USERNAME;
use stun::error_code::{ErrorCode, ErrorCodeAttribute};
use stun::integrity::MessageIntegrity;
use stun::message::{
    Getter, Message, MessageType, Setter, BINDING_REQUEST, BINDING_SUCCESS, CLASS_ERROR_RESPONSE, CLASS_REQUEST,
    CLASS_SUCCESS_RESPONSE, METHOD_BINDING,
};
use stun::textattrs::Username;
use stun::xoraddr::XorMappedAddress;

use crate::error::{Error, Result};
use crate::priority::PriorityAttr;
use crate::use_candidate::UseCandidateAttr;

/// Builds an outbound Binding request (spec §4.6): a fresh transaction id,
/// the synthetic peer-reflexive `PRIORITY`, `USE-CANDIDATE` iff nominating,
/// and `USERNAME`/`MESSAGE-INTEGRITY` signed with the `tx` credential.
/// `USERNAME` and `MESSAGE-INTEGRITY` are "added by the STUN layer" per
/// spec §4.6 — this facade plays that role since the crate speaks to the
/// `stun` wire-format crate directly rather than a separate STUN stack.
pub fn build_binding_request(priority: u32, nominate: bool, username: &str, password: &str) -> Result<Message> {
    let mut m = Message::new();
    let mut setters: Vec<Box<dyn Setter>> = vec![
        Box::new(BINDING_REQUEST),
        Box::new(TransactionId::new()),
        Box::new(PriorityAttr(priority)),
    ];
    if nominate {
        setters.push(Box::<UseCandidateAttr>::default());
    }
    setters.push(Box::new(Username::new(ATTR_USERNAME, username.to_string())));
    setters.push(Box::new(MessageIntegrity::new_short_term_integrity(password.to_string())));

    m.build(&setters).map_err(stun_to_error)?;
    Ok(m)
}

/// Builds a Binding success response carrying `XOR-MAPPED-ADDRESS` = the
/// observed source address, signed with `rx`'s password (spec §4.7 step
/// 4). Reuses the request's transaction id, as the `stun` crate's
/// transaction matching requires.
pub fn build_success_response(request: &Message, mapped: SocketAddr, password: &str) -> Result<Message> {
    let mut m = Message::new();
    m.transaction_id = request.transaction_id;
    m.build(&[
        Box::new(BINDING_SUCCESS),
        Box::new(XorMappedAddress { ip: mapped.ip(), port: mapped.port() }),
        Box::new(MessageIntegrity::new_short_term_integrity(password.to_string())),
    ])
    .map_err(stun_to_error)?;
    Ok(m)
}

/// Builds an error response echoing `request`'s method and transaction id
/// (spec §4.7 step 1: "Reject any non-Binding request with 400 Bad
/// Request"). `password` is the credential the response is signed with,
/// when one is available; anti-amplification drops (spec §7) never reach
/// this far and so never need a password.
pub fn build_error_response(request: &Message, code: u16, reason: &str) -> Result<Message> {
    let mut m = Message::new();
    m.transaction_id = request.transaction_id;
    m.build(&[
        Box::new(MessageType {
            method: request.typ.method,
            class: CLASS_ERROR_RESPONSE,
        }),
        Box::new(ErrorCodeAttribute {
            code: ErrorCode(code),
            reason: reason.as_bytes().to_vec(),
        }),
    ])
    .map_err(stun_to_error)?;
    Ok(m)
}

/// True iff `m` is a Binding request (spec §4.7 step 1: "Reject any
/// non-Binding request with 400 Bad Request" — callers test this first).
#[must_use]
pub fn is_binding_request(m: &Message) -> bool {
    m.typ.method == METHOD_BINDING && m.typ.class == CLASS_REQUEST
}

#[must_use]
pub fn is_success_response(m: &Message) -> bool {
    m.typ.method == METHOD_BINDING && m.typ.class == CLASS_SUCCESS_RESPONSE
}

/// Extracts `PRIORITY` from an inbound request (spec §4.7 step 5: "priority
/// taken from the request's PRIORITY attribute").
pub fn extract_priority(m: &Message) -> Result<u32> {
    let mut p = PriorityAttr::default();
    p.get_from(m).map_err(stun_to_error)?;
    Ok(p.0)
}

/// Extracts `XOR-MAPPED-ADDRESS` from a response (spec §4.6: "locate the
/// XOR-MAPPED-ADDRESS in the response. If absent, Failed(NoXorMap)").
pub fn extract_xor_mapped_address(m: &Message) -> Result<SocketAddr> {
    let mut addr = XorMappedAddress::default();
    addr.get_from(m).map_err(|_| Error::NoXorMappedAddress)?;
    Ok(SocketAddr::new(addr.ip, addr.port))
}

/// Verifies the request's `USERNAME` equals `expected` (spec §4.7 step 2).
pub fn assert_username(m: &Message, expected: &str) -> Result<()> {
    let mut username = Username::new(ATTR_USERNAME, String::new());
    username.get_from(m).map_err(stun_to_error)?;
    if username.to_string() != expected {
        return Err(Error::StunFailure {
            status: 401,
            reason: "username mismatch".into(),
        });
    }
    Ok(())
}

/// Verifies `MESSAGE-INTEGRITY` against `key` (spec §4.7 step 2).
pub fn assert_message_integrity(m: &mut Message, key: &[u8]) -> Result<()> {
    let integrity = MessageIntegrity(key.to_vec());
    integrity.check(m).map_err(stun_to_error)
}

fn stun_to_error(err: stun::Error) -> Error {
    Error::StunFailure {
        status: 400,
        reason: err.to_string(),
    }
}
