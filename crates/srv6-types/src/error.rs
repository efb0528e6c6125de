//! Error types for SRv6 value parsing, compression and behavior encoding.
//!
//! These are input-validation errors: they are detected locally, surfaced to
//! the immediate caller and never sent across the RPC boundary. Kernel and
//! transport failures travel as [`StatusCode`](crate::status::StatusCode)
//! data instead.

use thiserror::Error;

use crate::behavior::Seg6LocalAction;
use crate::sid::{Locator, Sid};
use crate::status::StatusCode;

/// Errors raised when parsing SRv6 value types from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The string is not a valid IP address.
    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// The string is not a valid IP prefix.
    #[error("Invalid IP prefix: {0}")]
    InvalidIpPrefix(String),

    /// The prefix length is out of range for the address family.
    #[error("Invalid prefix length in '{0}'")]
    InvalidPrefixLength(String),

    /// The string is not a known encapsulation mode.
    #[error("Invalid encap mode: {0}")]
    InvalidEncapMode(String),

    /// The string is not a known forwarding engine.
    #[error("Invalid forwarding engine: {0}")]
    InvalidFwdEngine(String),
}

/// Errors raised by the micro-segment compression codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// More segments than one micro-segment block can hold.
    #[error("Too many segments: {count} exceed the block capacity of {capacity}")]
    TooManySegments {
        /// Number of segments that were offered for one block.
        count: usize,
        /// Identifiers one block can hold with the given field widths.
        capacity: usize,
    },

    /// A SID does not share the locator of the rest of the list.
    #[error("Wrong locator for SID {sid}: expected {locator}")]
    LocatorMismatch {
        /// The offending SID.
        sid: Sid,
        /// The locator shared by the preceding SIDs.
        locator: Locator,
    },

    /// A SID has non-zero bits below its identifier field.
    #[error("Invalid SID {sid}: bits below the identifier field must be zero")]
    InvalidSid {
        /// The offending SID.
        sid: Sid,
    },

    /// The locator and identifier widths do not fit a 128-bit address.
    #[error("Invalid field widths: locator {locator_bits} + identifier {usid_id_bits} bits")]
    InvalidWidths {
        /// Number of locator bits requested.
        locator_bits: u8,
        /// Number of identifier bits requested.
        usid_id_bits: u8,
    },

    /// A locator cannot be derived from an empty segment list.
    #[error("Cannot compress an empty segment list")]
    EmptySegmentList,
}

/// Errors raised by the forwarding action encoder.
///
/// Every variant maps to `STATUS_INVALID_ACTION` on the wire; the variants
/// exist so the immediate caller can tell which parameter was missing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The action string does not name a known seg6local behavior.
    #[error("Unrecognized seg6local action: '{0}'")]
    UnknownAction(String),

    /// The operation requires an action but none was supplied.
    #[error("Missing action for seg6local route")]
    MissingAction,

    /// A cross-connect action was given no nexthop.
    #[error("{action} requires a nexthop address")]
    MissingNexthop {
        /// The action that was being encoded.
        action: Seg6LocalAction,
    },

    /// The nexthop address family does not match the action.
    #[error("{action} requires an {expected} nexthop")]
    NexthopFamily {
        /// The action that was being encoded.
        action: Seg6LocalAction,
        /// "IPv4" or "IPv6".
        expected: &'static str,
    },

    /// A decap action was given no lookup table.
    #[error("{action} requires a lookup table")]
    MissingLookupTable {
        /// The action that was being encoded.
        action: Seg6LocalAction,
    },

    /// An L2 cross-connect action was given no outgoing interface.
    #[error("{action} requires an outgoing interface")]
    MissingInterface {
        /// The action that was being encoded.
        action: Seg6LocalAction,
    },

    /// A binding action was given no sub-segment list.
    #[error("{action} requires a segment list")]
    MissingSegments {
        /// The action that was being encoded.
        action: Seg6LocalAction,
    },
}

impl EncodeError {
    /// The status code this error maps to on the RPC boundary.
    pub fn status(&self) -> StatusCode {
        StatusCode::InvalidAction
    }
}
