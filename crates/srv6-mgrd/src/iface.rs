//! Local interface enumeration and the name-to-index cache.
//!
//! The cache is built once at daemon startup and partitioned into loopback
//! and non-loopback interfaces; the first non-loopback interface is the
//! default egress device for routes that do not name one. The cache is
//! never rebuilt behind the caller's back: if interfaces change at
//! runtime, [`InterfaceCache::refresh`] must be called explicitly, and a
//! lookup miss simply reports an unknown device.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::{MgrError, MgrResult};
use crate::shell::{self, IP_CMD};

/// One entry of `ip -j link show` output; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct LinkEntry {
    ifindex: u32,
    ifname: String,
    #[serde(default)]
    flags: Vec<String>,
}

/// Loopback/non-loopback partition of the local interfaces plus the
/// name-to-index mapping.
#[derive(Debug, Clone, Default)]
pub struct InterfaceCache {
    loopback: Vec<String>,
    non_loopback: Vec<String>,
    index_by_name: HashMap<String, u32>,
}

impl InterfaceCache {
    /// Builds the cache by enumerating the local interfaces.
    pub async fn load() -> MgrResult<Self> {
        let output = shell::exec_or_throw(&format!("{} -j link show", IP_CMD)).await?;
        Self::from_json(&output)
    }

    /// Builds the cache from `ip -j link show` JSON output.
    pub fn from_json(json: &str) -> MgrResult<Self> {
        let links: Vec<LinkEntry> =
            serde_json::from_str(json).map_err(|e| MgrError::link_parse(e.to_string()))?;
        let mut cache = InterfaceCache::default();
        for link in links {
            if link.flags.iter().any(|flag| flag == "LOOPBACK") {
                cache.loopback.push(link.ifname.clone());
            } else {
                cache.non_loopback.push(link.ifname.clone());
            }
            cache.index_by_name.insert(link.ifname, link.ifindex);
        }
        Ok(cache)
    }

    /// Re-enumerates the local interfaces, replacing the cached view.
    pub async fn refresh(&mut self) -> MgrResult<()> {
        *self = Self::load().await?;
        Ok(())
    }

    /// The default egress device: the first non-loopback interface.
    pub fn default_device(&self) -> Option<&str> {
        self.non_loopback.first().map(String::as_str)
    }

    /// Looks up an interface index by name.
    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.index_by_name.get(name).copied()
    }

    /// Returns true if the interface is known to the cache.
    pub fn contains(&self, name: &str) -> bool {
        self.index_by_name.contains_key(name)
    }

    /// Loopback interface names.
    pub fn loopback(&self) -> &[String] {
        &self.loopback
    }

    /// Non-loopback interface names.
    pub fn non_loopback(&self) -> &[String] {
        &self.non_loopback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINKS_JSON: &str = r#"[
        {"ifindex": 1, "ifname": "lo", "flags": ["LOOPBACK", "UP", "LOWER_UP"], "mtu": 65536},
        {"ifindex": 2, "ifname": "eth0", "flags": ["BROADCAST", "MULTICAST", "UP"], "mtu": 1500},
        {"ifindex": 3, "ifname": "eth1", "flags": ["BROADCAST", "MULTICAST"], "mtu": 1500}
    ]"#;

    #[test]
    fn test_partition_and_index() {
        let cache = InterfaceCache::from_json(LINKS_JSON).unwrap();
        assert_eq!(cache.loopback(), &["lo".to_string()]);
        assert_eq!(
            cache.non_loopback(),
            &["eth0".to_string(), "eth1".to_string()]
        );
        assert_eq!(cache.resolve("lo"), Some(1));
        assert_eq!(cache.resolve("eth1"), Some(3));
        assert_eq!(cache.resolve("eth9"), None);
    }

    #[test]
    fn test_default_device_is_first_non_loopback() {
        let cache = InterfaceCache::from_json(LINKS_JSON).unwrap();
        assert_eq!(cache.default_device(), Some("eth0"));
    }

    #[test]
    fn test_no_non_loopback() {
        let cache = InterfaceCache::from_json(
            r#"[{"ifindex": 1, "ifname": "lo", "flags": ["LOOPBACK"]}]"#,
        )
        .unwrap();
        assert_eq!(cache.default_device(), None);
        assert!(cache.contains("lo"));
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            InterfaceCache::from_json("not json"),
            Err(MgrError::LinkParse { .. })
        ));
    }
}
