//! SID, locator and prefix value types with safe parsing.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

/// A segment identifier: a 128-bit IPv6 address naming a segment routing
/// instruction or waypoint.
///
/// Comparison is on the address value, so two SIDs written with different
/// letter case or zero compression are equal. Display always yields the
/// canonical lower-case compressed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sid(Ipv6Addr);

impl Sid {
    /// The unspecified address (`::`), used to express a route with no SRH.
    pub const UNSPECIFIED: Self = Sid(Ipv6Addr::UNSPECIFIED);

    pub const fn new(addr: Ipv6Addr) -> Self {
        Sid(addr)
    }

    pub const fn inner(&self) -> Ipv6Addr {
        self.0
    }

    /// The address as a raw 128-bit integer, for mask arithmetic.
    pub fn bits(&self) -> u128 {
        u128::from(self.0)
    }

    /// Builds a SID from a raw 128-bit integer.
    pub fn from_bits(bits: u128) -> Self {
        Sid(Ipv6Addr::from(bits))
    }
}

impl fmt::Display for Sid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Sid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv6Addr>()
            .map(Sid)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl From<Ipv6Addr> for Sid {
    fn from(addr: Ipv6Addr) -> Self {
        Sid(addr)
    }
}

impl From<Sid> for Ipv6Addr {
    fn from(sid: Sid) -> Self {
        sid.0
    }
}

/// The address prefix shared by the SIDs of one administrative domain.
///
/// A locator is an address whose bits beyond the locator width are zero;
/// the width itself travels separately (see [`crate::usid`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(Ipv6Addr);

impl Locator {
    pub const fn new(addr: Ipv6Addr) -> Self {
        Locator(addr)
    }

    pub const fn inner(&self) -> Ipv6Addr {
        self.0
    }

    /// The locator as a raw 128-bit integer, for mask arithmetic.
    pub fn bits(&self) -> u128 {
        u128::from(self.0)
    }

    /// Builds a locator from a raw 128-bit integer.
    pub fn from_bits(bits: u128) -> Self {
        Locator(Ipv6Addr::from(bits))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Locator {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv6Addr>()
            .map(Locator)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

/// An IPv4 or IPv6 address with an optional prefix length.
///
/// Used for route destinations, which may be a host address or a subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    addr: IpAddr,
    len: Option<u8>,
}

impl IpPrefix {
    /// A host prefix (no explicit length).
    pub fn host(addr: IpAddr) -> Self {
        IpPrefix { addr, len: None }
    }

    pub fn new(addr: IpAddr, len: u8) -> Self {
        IpPrefix {
            addr,
            len: Some(len),
        }
    }

    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    pub const fn len(&self) -> Option<u8> {
        self.len
    }

    pub fn is_v4(&self) -> bool {
        self.addr.is_ipv4()
    }

    pub fn is_v6(&self) -> bool {
        self.addr.is_ipv6()
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.len {
            Some(len) => write!(f, "{}/{}", self.addr, len),
            None => self.addr.fmt(f),
        }
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, len_part) = match s.split_once('/') {
            Some((addr, len)) => (addr, Some(len)),
            None => (s, None),
        };
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;
        let len = match len_part {
            Some(raw) => {
                let len: u8 = raw
                    .parse()
                    .map_err(|_| ParseError::InvalidPrefixLength(s.to_string()))?;
                let max = if addr.is_ipv4() { 32 } else { 128 };
                if len > max {
                    return Err(ParseError::InvalidPrefixLength(s.to_string()));
                }
                Some(len)
            }
            None => None,
        };
        Ok(IpPrefix { addr, len })
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> Self {
        prefix.to_string()
    }
}

impl From<Sid> for IpPrefix {
    fn from(sid: Sid) -> Self {
        IpPrefix::host(IpAddr::V6(sid.inner()))
    }
}
