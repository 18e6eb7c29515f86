//! Cluster properties consumed by [`ClusterConfigBuilder`](crate::ClusterConfigBuilder).
//!
//! The consumer populates these structs however they want (TOML, env vars,
//! a settings service); clustercfg does no file I/O or env reading. All
//! structs derive `Deserialize` with kebab-case keys and fall back to the
//! defaults below for anything left unset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Application-level cluster properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClusterProperties {
    /// Name of the cache instance within the process.
    pub instance_name: String,
    /// Port the member listens on.
    pub port: u16,
    /// Try the next ports when `port` is taken.
    pub port_auto_increment: bool,
    /// Join through the static `members` list.
    pub tcpip_enabled: bool,
    /// Static member addresses (`host` or `host:port`).
    pub members: Vec<String>,
    /// TCP/IP connection timeout (seconds).
    pub timeout: u64,
    /// Multicast join settings.
    pub multicast: MulticastProperties,
    /// Pluggable discovery settings.
    pub discovery: DiscoveryProperties,
    /// Synchronous backups per map entry.
    pub backup_count: u32,
    /// Asynchronous backups per map entry.
    pub async_backup_count: u32,
    /// Eviction policy name, e.g. `LRU`.
    pub eviction_policy: String,
    /// Max-size policy name, e.g. `USED_HEAP_PERCENTAGE`.
    pub max_size_policy: String,
    /// Size threshold handed to the max-size policy.
    pub max_heap_size_percentage: u32,
    /// Partition member group type, e.g. `HOST_AWARE`. Blank disables grouping.
    pub partition_member_group_type: Option<String>,
    /// Logging backend the runtime should use.
    pub logging_type: String,
    /// Seconds without a heartbeat before a member is considered dead.
    pub max_no_heartbeat_seconds: u64,
    /// Prefer the IPv4 stack.
    pub ipv4_enabled: bool,
}

/// Multicast join properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MulticastProperties {
    pub enabled: bool,
    pub group: String,
    pub port: u16,
    pub time_to_live: u32,
    /// Seconds to wait for a multicast response.
    pub timeout: u64,
    /// Comma-delimited interface list (`"eth0, 10.0.0.*"`). Empty means any.
    pub trusted_interfaces: String,
}

/// Pluggable discovery properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryProperties {
    pub enabled: bool,
    /// Name of the registered provider to use when more than one is available.
    pub provider: Option<String>,
    /// Provider-specific settings, passed through untouched.
    pub properties: BTreeMap<String, String>,
}

impl Default for MulticastProperties {
    fn default() -> Self {
        Self {
            enabled: false,
            group: "224.2.2.3".to_string(),
            port: 54327,
            time_to_live: 32,
            timeout: 2,
            trusted_interfaces: String::new(),
        }
    }
}

impl Default for ClusterProperties {
    fn default() -> Self {
        Self {
            instance_name: "localhost".to_string(),
            port: 5701,
            port_auto_increment: true,
            tcpip_enabled: true,
            members: vec!["localhost".to_string()],
            timeout: 5,
            multicast: MulticastProperties::default(),
            discovery: DiscoveryProperties::default(),
            backup_count: 1,
            async_backup_count: 0,
            eviction_policy: "LRU".to_string(),
            max_size_policy: "USED_HEAP_PERCENTAGE".to_string(),
            max_heap_size_percentage: 85,
            partition_member_group_type: None,
            logging_type: "slf4j".to_string(),
            max_no_heartbeat_seconds: 300,
            ipv4_enabled: true,
        }
    }
}

impl ClusterProperties {
    /// Returns the partition group type if one is set to something non-blank.
    pub fn partition_group_type(&self) -> Option<&str> {
        self.partition_member_group_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns true if a discovery provider drives the join.
    pub fn is_discovery_join(&self) -> bool {
        self.discovery.enabled
    }
}
