//! seg6local behaviors (forwarding actions) and the behavior encoder.
//!
//! A behavior describes what a node does when it is the active segment of a
//! packet: plain endpoint processing, cross-connect to a nexthop, decap plus
//! table lookup, or re-entry into another policy through a binding SID.
//! [`encode_behavior`] turns a loose behavior configuration into the exact
//! encapsulation attribute set the kernel route needs, or rejects it when a
//! required parameter is missing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::EncodeError;
use crate::path::UNSET;
use crate::sid::Sid;

/// The closed set of seg6local forwarding actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Seg6LocalAction {
    /// Plain endpoint: advance to the next segment.
    #[serde(rename = "End")]
    End,
    /// Endpoint with L3 cross-connect to an IPv6 nexthop.
    #[serde(rename = "End.X")]
    EndX,
    /// Endpoint with lookup in a specific routing table.
    #[serde(rename = "End.T")]
    EndT,
    /// Decap and L2 cross-connect to an outgoing interface.
    #[serde(rename = "End.DX2")]
    EndDx2,
    /// Decap and cross-connect to an IPv6 nexthop.
    #[serde(rename = "End.DX6")]
    EndDx6,
    /// Decap and cross-connect to an IPv4 nexthop.
    #[serde(rename = "End.DX4")]
    EndDx4,
    /// Decap and IPv6 lookup in a specific table.
    #[serde(rename = "End.DT6")]
    EndDt6,
    /// Decap and IPv4 lookup in a specific table.
    #[serde(rename = "End.DT4")]
    EndDt4,
    /// Decap and address-family-agnostic lookup in a VRF table.
    #[serde(rename = "End.DT46")]
    EndDt46,
    /// Insert a new SRH carrying the bound segment list.
    #[serde(rename = "End.B6")]
    EndB6,
    /// Encapsulate in an outer IPv6 header with the bound segment list.
    #[serde(rename = "End.B6.Encaps")]
    EndB6Encaps,
    /// Micro-segment endpoint: shift and forward.
    #[serde(rename = "uN")]
    UN,
}

impl Seg6LocalAction {
    /// Every action, in the order of the behavior dispatch table.
    pub const ALL: [Seg6LocalAction; 12] = [
        Seg6LocalAction::End,
        Seg6LocalAction::EndX,
        Seg6LocalAction::EndT,
        Seg6LocalAction::EndDx2,
        Seg6LocalAction::EndDx6,
        Seg6LocalAction::EndDx4,
        Seg6LocalAction::EndDt6,
        Seg6LocalAction::EndDt4,
        Seg6LocalAction::EndDt46,
        Seg6LocalAction::EndB6,
        Seg6LocalAction::EndB6Encaps,
        Seg6LocalAction::UN,
    ];

    /// The action name as it appears on the wire and in `ip route` output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Seg6LocalAction::End => "End",
            Seg6LocalAction::EndX => "End.X",
            Seg6LocalAction::EndT => "End.T",
            Seg6LocalAction::EndDx2 => "End.DX2",
            Seg6LocalAction::EndDx6 => "End.DX6",
            Seg6LocalAction::EndDx4 => "End.DX4",
            Seg6LocalAction::EndDt6 => "End.DT6",
            Seg6LocalAction::EndDt4 => "End.DT4",
            Seg6LocalAction::EndDt46 => "End.DT46",
            Seg6LocalAction::EndB6 => "End.B6",
            Seg6LocalAction::EndB6Encaps => "End.B6.Encaps",
            Seg6LocalAction::UN => "uN",
        }
    }
}

impl fmt::Display for Seg6LocalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Seg6LocalAction {
    type Err = EncodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| EncodeError::UnknownAction(s.to_string()))
    }
}

/// A seg6local behavior as requested by a client.
///
/// Parameters beyond the local segment are loose: which of them are
/// required depends on the action, and [`encode_behavior`] enforces that.
/// `table`, `metric` and `lookup_table` use the `-1` sentinel for "unset";
/// `device` and `interface` use the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// The local segment this node terminates.
    pub segment: Sid,
    /// The forwarding action. Not required for delete.
    #[serde(default)]
    pub action: Option<Seg6LocalAction>,
    /// Nexthop for cross-connect actions (End.X, End.DX4, End.DX6).
    #[serde(default)]
    pub nexthop: Option<IpAddr>,
    /// Lookup table for decap actions (End.T, End.DT4, End.DT6, End.DT46).
    #[serde(default = "unset")]
    pub lookup_table: i32,
    /// Outgoing interface for End.DX2.
    #[serde(default)]
    pub interface: String,
    /// Sub-segment list for binding actions (End.B6, End.B6.Encaps),
    /// ingress-first order.
    #[serde(default)]
    pub segs: Vec<Sid>,
    /// Device of the seg6local route; empty means the agent picks one.
    #[serde(default)]
    pub device: String,
    /// Routing table of the seg6local route; -1 means the main table.
    #[serde(default = "unset")]
    pub table: i32,
    /// Metric of the seg6local route; -1 leaves the choice to the kernel.
    #[serde(default = "unset")]
    pub metric: i32,
}

fn unset() -> i32 {
    UNSET
}

impl BehaviorConfig {
    pub fn new(segment: Sid) -> Self {
        Self {
            segment,
            action: None,
            nexthop: None,
            lookup_table: UNSET,
            interface: String::new(),
            segs: Vec::new(),
            device: String::new(),
            table: UNSET,
            metric: UNSET,
        }
    }

    pub fn with_action(mut self, action: Seg6LocalAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_nexthop(mut self, nexthop: IpAddr) -> Self {
        self.nexthop = Some(nexthop);
        self
    }

    pub fn with_lookup_table(mut self, lookup_table: i32) -> Self {
        self.lookup_table = lookup_table;
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    pub fn with_segs(mut self, segs: Vec<Sid>) -> Self {
        self.segs = segs;
        self
    }

    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Routing table, with the sentinel resolved to `None`.
    pub fn table(&self) -> Option<u32> {
        u32::try_from(self.table).ok()
    }

    /// Metric, with the sentinel resolved to `None`.
    pub fn metric(&self) -> Option<u32> {
        u32::try_from(self.metric).ok()
    }
}

/// The encapsulation attributes of one seg6local route, ready to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seg6LocalEncap {
    /// The forwarding action.
    pub action: Seg6LocalAction,
    /// The action-specific attribute set.
    pub attrs: Seg6LocalAttrs,
}

/// Action-specific encapsulation attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seg6LocalAttrs {
    /// No attributes (End, uN).
    None,
    /// IPv6 nexthop (End.X, End.DX6).
    Nexthop6 {
        nh6: Ipv6Addr,
    },
    /// IPv4 nexthop (End.DX4).
    Nexthop4 {
        nh4: Ipv4Addr,
    },
    /// Lookup table (End.T, End.DT4, End.DT6).
    Table {
        table: u32,
    },
    /// VRF lookup table (End.DT46).
    VrfTable {
        vrf_table: u32,
    },
    /// Outgoing interface (End.DX2).
    Interface {
        oif: String,
    },
    /// SRH carrying a bound segment list (End.B6, End.B6.Encaps).
    ///
    /// The list is stored in installation order, which is the reverse of
    /// the ingress-first order the caller supplied.
    Srh {
        segs: Vec<Sid>,
    },
}

/// Maps a behavior configuration onto its encapsulation attribute set.
///
/// Total over [`Seg6LocalAction`]: every action either produces its
/// attribute set or fails with the [`EncodeError`] naming the parameter it
/// is missing. The sub-segment list of binding actions is reversed here,
/// immediately before the attribute set is built, and nowhere else.
pub fn encode_behavior(config: &BehaviorConfig) -> Result<Seg6LocalEncap, EncodeError> {
    let action = config.action.ok_or(EncodeError::MissingAction)?;
    let attrs = match action {
        Seg6LocalAction::End | Seg6LocalAction::UN => Seg6LocalAttrs::None,
        Seg6LocalAction::EndX | Seg6LocalAction::EndDx6 => match config.nexthop {
            Some(IpAddr::V6(nh6)) => Seg6LocalAttrs::Nexthop6 { nh6 },
            Some(IpAddr::V4(_)) => {
                return Err(EncodeError::NexthopFamily {
                    action,
                    expected: "IPv6",
                })
            }
            None => return Err(EncodeError::MissingNexthop { action }),
        },
        Seg6LocalAction::EndDx4 => match config.nexthop {
            Some(IpAddr::V4(nh4)) => Seg6LocalAttrs::Nexthop4 { nh4 },
            Some(IpAddr::V6(_)) => {
                return Err(EncodeError::NexthopFamily {
                    action,
                    expected: "IPv4",
                })
            }
            None => return Err(EncodeError::MissingNexthop { action }),
        },
        Seg6LocalAction::EndT | Seg6LocalAction::EndDt4 | Seg6LocalAction::EndDt6 => {
            match u32::try_from(config.lookup_table) {
                Ok(table) => Seg6LocalAttrs::Table { table },
                Err(_) => return Err(EncodeError::MissingLookupTable { action }),
            }
        }
        Seg6LocalAction::EndDt46 => match u32::try_from(config.lookup_table) {
            Ok(vrf_table) => Seg6LocalAttrs::VrfTable { vrf_table },
            Err(_) => return Err(EncodeError::MissingLookupTable { action }),
        },
        Seg6LocalAction::EndDx2 => {
            if config.interface.is_empty() {
                return Err(EncodeError::MissingInterface { action });
            }
            Seg6LocalAttrs::Interface {
                oif: config.interface.clone(),
            }
        }
        Seg6LocalAction::EndB6 | Seg6LocalAction::EndB6Encaps => {
            if config.segs.is_empty() {
                return Err(EncodeError::MissingSegments { action });
            }
            // The kernel stores SRH segments in reverse of travel order.
            let segs: Vec<Sid> = config.segs.iter().rev().copied().collect();
            Seg6LocalAttrs::Srh { segs }
        }
    };
    Ok(Seg6LocalEncap { action, attrs })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(addr: &str) -> Sid {
        addr.parse().unwrap()
    }

    fn base(action: Seg6LocalAction) -> BehaviorConfig {
        BehaviorConfig::new(sid("fc00:1::1")).with_action(action)
    }

    /// Required parameters that make each action encodable.
    fn complete(action: Seg6LocalAction) -> BehaviorConfig {
        let config = base(action);
        match action {
            Seg6LocalAction::EndX | Seg6LocalAction::EndDx6 => {
                config.with_nexthop("fc00:2::1".parse().unwrap())
            }
            Seg6LocalAction::EndDx4 => config.with_nexthop("10.0.0.1".parse().unwrap()),
            Seg6LocalAction::EndT
            | Seg6LocalAction::EndDt4
            | Seg6LocalAction::EndDt6
            | Seg6LocalAction::EndDt46 => config.with_lookup_table(254),
            Seg6LocalAction::EndDx2 => config.with_interface("eth1"),
            Seg6LocalAction::EndB6 | Seg6LocalAction::EndB6Encaps => {
                config.with_segs(vec![sid("fc00:3::1"), sid("fc00:3::2")])
            }
            Seg6LocalAction::End | Seg6LocalAction::UN => config,
        }
    }

    #[test]
    fn test_action_names_round_trip() {
        for action in Seg6LocalAction::ALL {
            let parsed: Seg6LocalAction = action.as_str().parse().unwrap();
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = "End.DX9".parse::<Seg6LocalAction>().unwrap_err();
        assert_eq!(err, EncodeError::UnknownAction("End.DX9".to_string()));
    }

    #[test]
    fn test_encoder_total_over_actions() {
        // Every action with its required parameters encodes deterministically.
        for action in Seg6LocalAction::ALL {
            let encap = encode_behavior(&complete(action)).unwrap();
            assert_eq!(encap.action, action);
            let again = encode_behavior(&complete(action)).unwrap();
            assert_eq!(encap, again);
        }
    }

    #[test]
    fn test_attribute_sets() {
        assert_eq!(
            encode_behavior(&complete(Seg6LocalAction::End)).unwrap().attrs,
            Seg6LocalAttrs::None
        );
        assert_eq!(
            encode_behavior(&complete(Seg6LocalAction::EndX)).unwrap().attrs,
            Seg6LocalAttrs::Nexthop6 {
                nh6: "fc00:2::1".parse().unwrap()
            }
        );
        assert_eq!(
            encode_behavior(&complete(Seg6LocalAction::EndDx4)).unwrap().attrs,
            Seg6LocalAttrs::Nexthop4 {
                nh4: "10.0.0.1".parse().unwrap()
            }
        );
        assert_eq!(
            encode_behavior(&complete(Seg6LocalAction::EndDt6)).unwrap().attrs,
            Seg6LocalAttrs::Table { table: 254 }
        );
        assert_eq!(
            encode_behavior(&complete(Seg6LocalAction::EndDt46)).unwrap().attrs,
            Seg6LocalAttrs::VrfTable { vrf_table: 254 }
        );
        assert_eq!(
            encode_behavior(&complete(Seg6LocalAction::EndDx2)).unwrap().attrs,
            Seg6LocalAttrs::Interface {
                oif: "eth1".to_string()
            }
        );
    }

    #[test]
    fn test_missing_params_fail_with_specific_errors() {
        assert_eq!(
            encode_behavior(&base(Seg6LocalAction::EndX)).unwrap_err(),
            EncodeError::MissingNexthop {
                action: Seg6LocalAction::EndX
            }
        );
        assert_eq!(
            encode_behavior(&base(Seg6LocalAction::EndT)).unwrap_err(),
            EncodeError::MissingLookupTable {
                action: Seg6LocalAction::EndT
            }
        );
        assert_eq!(
            encode_behavior(&base(Seg6LocalAction::EndDx2)).unwrap_err(),
            EncodeError::MissingInterface {
                action: Seg6LocalAction::EndDx2
            }
        );
        assert_eq!(
            encode_behavior(&base(Seg6LocalAction::EndB6)).unwrap_err(),
            EncodeError::MissingSegments {
                action: Seg6LocalAction::EndB6
            }
        );
        assert_eq!(
            encode_behavior(&BehaviorConfig::new(sid("fc00:1::1"))).unwrap_err(),
            EncodeError::MissingAction
        );
    }

    #[test]
    fn test_nexthop_family_mismatch() {
        let config = base(Seg6LocalAction::EndDx6).with_nexthop("10.0.0.1".parse().unwrap());
        assert_eq!(
            encode_behavior(&config).unwrap_err(),
            EncodeError::NexthopFamily {
                action: Seg6LocalAction::EndDx6,
                expected: "IPv6"
            }
        );
        let config = base(Seg6LocalAction::EndDx4).with_nexthop("fc00:2::1".parse().unwrap());
        assert_eq!(
            encode_behavior(&config).unwrap_err(),
            EncodeError::NexthopFamily {
                action: Seg6LocalAction::EndDx4,
                expected: "IPv4"
            }
        );
    }

    #[test]
    fn test_b6_segments_reversed() {
        let forward = vec![sid("fc00:3::1"), sid("fc00:3::2"), sid("fc00:3::3")];
        let config = base(Seg6LocalAction::EndB6Encaps).with_segs(forward.clone());
        let encap = encode_behavior(&config).unwrap();
        let Seg6LocalAttrs::Srh { segs } = encap.attrs else {
            panic!("expected SRH attributes");
        };
        let reversed: Vec<Sid> = forward.iter().rev().copied().collect();
        assert_eq!(segs, reversed);
        // Reversing twice restores the caller's order.
        let back: Vec<Sid> = segs.iter().rev().copied().collect();
        assert_eq!(back, forward);
    }

    #[test]
    fn test_action_serde_wire_names() {
        let json = serde_json::to_string(&Seg6LocalAction::EndB6Encaps).unwrap();
        assert_eq!(json, "\"End.B6.Encaps\"");
        let back: Seg6LocalAction = serde_json::from_str("\"End.DT46\"").unwrap();
        assert_eq!(back, Seg6LocalAction::EndDt46);
    }
}
