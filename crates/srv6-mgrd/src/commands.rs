//! iproute2 command builders for seg6 and seg6local routes.

use srv6_types::usid::{DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS};
use srv6_types::{EncapMode, IpPrefix, Seg6LocalAction, Seg6LocalAttrs, Seg6LocalEncap, Sid};

use crate::shell::{shellquote, IP_CMD};

use srv6_rpc::Operation;

/// `ip route` or `ip -6 route`, depending on the destination family.
fn route_base(dest: &IpPrefix) -> String {
    if dest.is_v4() {
        format!("{} route", IP_CMD)
    } else {
        format!("{} -6 route", IP_CMD)
    }
}

fn join_segs(segs: &[Sid]) -> String {
    segs.iter()
        .map(Sid::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn append_route_opts(cmd: &mut String, device: Option<&str>, table: Option<u32>, metric: Option<u32>) {
    if let Some(device) = device {
        cmd.push_str(&format!(" dev {}", shellquote(device)));
    }
    if let Some(table) = table {
        cmd.push_str(&format!(" table {}", table));
    }
    if let Some(metric) = metric {
        cmd.push_str(&format!(" metric {}", metric));
    }
}

/// Builds a seg6 steering route command.
///
/// `segs` must already be in installation order; this builder renders
/// attributes, it never reorders them.
pub fn seg6_route_cmd(
    operation: Operation,
    dest: &IpPrefix,
    mode: EncapMode,
    segs: &[Sid],
    device: Option<&str>,
    table: Option<u32>,
    metric: Option<u32>,
) -> String {
    let mut cmd = format!(
        "{} {} {} encap seg6 mode {} segs {}",
        route_base(dest),
        operation,
        shellquote(&dest.to_string()),
        mode,
        join_segs(segs)
    );
    append_route_opts(&mut cmd, device, table, metric);
    cmd
}

/// Builds a route deletion command; deletion matches on the destination
/// key, no encapsulation payload is needed.
pub fn route_del_cmd(
    dest: &IpPrefix,
    device: Option<&str>,
    table: Option<u32>,
    metric: Option<u32>,
) -> String {
    let mut cmd = format!("{} del {}", route_base(dest), shellquote(&dest.to_string()));
    append_route_opts(&mut cmd, device, table, metric);
    cmd
}

/// Renders the action and its attribute set as iproute2 tokens.
fn seg6local_action_tokens(encap: &Seg6LocalEncap) -> String {
    // uN is expressed as End with the next-csid flavor in iproute2 terms.
    let mut tokens = if encap.action == Seg6LocalAction::UN {
        format!(
            "End flavors next-csid lblen {} nflen {}",
            DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS
        )
    } else {
        encap.action.as_str().to_string()
    };
    match &encap.attrs {
        Seg6LocalAttrs::None => {}
        Seg6LocalAttrs::Nexthop6 { nh6 } => tokens.push_str(&format!(" nh6 {}", nh6)),
        Seg6LocalAttrs::Nexthop4 { nh4 } => tokens.push_str(&format!(" nh4 {}", nh4)),
        Seg6LocalAttrs::Table { table } => tokens.push_str(&format!(" table {}", table)),
        Seg6LocalAttrs::VrfTable { vrf_table } => {
            tokens.push_str(&format!(" vrftable {}", vrf_table))
        }
        Seg6LocalAttrs::Interface { oif } => tokens.push_str(&format!(" oif {}", shellquote(oif))),
        Seg6LocalAttrs::Srh { segs } => tokens.push_str(&format!(" srh segs {}", join_segs(segs))),
    }
    tokens
}

/// Builds a seg6local behavior route command. seg6local routes are always
/// IPv6.
pub fn seg6local_route_cmd(
    operation: Operation,
    segment: &Sid,
    encap: &Seg6LocalEncap,
    device: &str,
    table: Option<u32>,
    metric: Option<u32>,
) -> String {
    let mut cmd = format!(
        "{} -6 route {} {} encap seg6local action {}",
        IP_CMD,
        operation,
        shellquote(&segment.to_string()),
        seg6local_action_tokens(encap)
    );
    append_route_opts(&mut cmd, Some(device), table, metric);
    cmd
}

/// Builds a seg6local route deletion command, keyed by the local segment
/// alone.
pub fn seg6local_route_del_cmd(
    segment: &Sid,
    device: &str,
    table: Option<u32>,
    metric: Option<u32>,
) -> String {
    let mut cmd = format!("{} -6 route del {}", IP_CMD, shellquote(&segment.to_string()));
    append_route_opts(&mut cmd, Some(device), table, metric);
    cmd
}
