#[cfg(test)]
mod network_type_test;

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// The address family of a candidate's transport address.
///
/// Pairing requires the local and remote candidate of a check to agree on
/// this (spec §3, §4.4) — the engine never mixes IPv4 and IPv6 in a pair.
#[derive(PartialEq, Debug, Copy, Clone, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    #[serde(rename = "udp4")]
    Udp4,

    #[serde(rename = "udp6")]
    Udp6,
}

impl NetworkType {
    #[must_use]
    pub fn of(ip: &IpAddr) -> Self {
        if ip.is_ipv4() {
            Self::Udp4
        } else {
            Self::Udp6
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Udp4 => "udp4",
            Self::Udp6 => "udp6",
        };
        write!(f, "{s}")
    }
}
