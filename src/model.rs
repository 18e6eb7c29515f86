//! Output types handed to the clustering runtime.
//!
//! A [`ClusterConfig`] is assembled by
//! [`ClusterConfigBuilder`](crate::ClusterConfigBuilder) or decoded with
//! [`ClusterConfig::from_msgpack`]; both paths run the checks below. A
//! [`MapSpec`] deserialized by other means is checked again when it is handed
//! to the builder.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::policy::{EvictionPolicy, MaxSizePolicy, MemberGroupType};
use crate::ConfigError;

/// Runtime property: whether pluggable discovery drives the join.
pub const DISCOVERY_ENABLED_PROP: &str = "cluster.discovery.enabled";
/// Runtime property: prefer the IPv4 stack.
pub const IPV4_STACK_PROP: &str = "cluster.prefer.ipv4.stack";
/// Runtime property: logging backend.
pub const LOGGING_TYPE_PROP: &str = "cluster.logging.type";
/// Runtime property: seconds without heartbeat before a member is dropped.
pub const MAX_HEARTBEAT_SECONDS_PROP: &str = "cluster.max.no.heartbeat.seconds";

/// Sync + async backups a single map may request.
pub const MAX_BACKUP_COUNT: u32 = 6;

pub const MAX_MULTICAST_TTL: u32 = 255;

// ============================================================================
// ClusterConfig
// ============================================================================

/// Fully assembled cluster configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    instance_name: String,
    network: NetworkConfig,
    map_configs: BTreeMap<String, MapSpec>,
    partition_group: PartitionGroupConfig,
    properties: BTreeMap<String, String>,
}

impl ClusterConfig {
    pub(crate) fn new(
        instance_name: String,
        network: NetworkConfig,
        map_configs: BTreeMap<String, MapSpec>,
        partition_group: PartitionGroupConfig,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            instance_name,
            network,
            map_configs,
            partition_group,
            properties,
        }
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Shortcut for `network().join()`.
    pub fn join(&self) -> &JoinStrategy {
        self.network.join()
    }

    /// Per-map settings, keyed by map name.
    pub fn map_configs(&self) -> &BTreeMap<String, MapSpec> {
        &self.map_configs
    }

    pub fn map_config(&self, name: &str) -> Option<&MapSpec> {
        self.map_configs.get(name)
    }

    pub fn partition_group(&self) -> &PartitionGroupConfig {
        &self.partition_group
    }

    /// String-typed runtime flags.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Encode for a bootstrapper running in another process (MessagePack).
    pub fn to_msgpack(&self) -> Result<Vec<u8>, ConfigError> {
        rmp_serde::to_vec_named(self).map_err(|e| ConfigError::Encode(e.to_string()))
    }

    /// Decode a configuration produced by [`to_msgpack`](Self::to_msgpack).
    ///
    /// The decoded value is validated like a freshly built one.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self =
            rmp_serde::from_slice(bytes).map_err(|e| ConfigError::Decode(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the map settings and the multicast join, if any.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_map_configs(&self.map_configs)?;
        if let Some(multicast) = self.join().multicast() {
            validate_multicast_endpoint(&multicast.group, multicast.time_to_live)?;
        }
        Ok(())
    }
}

// ============================================================================
// Network & join
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub port: u16,
    pub port_auto_increment: bool,
    pub join: JoinStrategy,
}

impl NetworkConfig {
    pub fn join(&self) -> &JoinStrategy {
        &self.join
    }
}

/// How a new member finds the cluster. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStrategy {
    StaticMembers(TcpIpConfig),
    Multicast(MulticastConfig),
    Discovery(DiscoveryStrategyConfig),
}

impl JoinStrategy {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StaticMembers(_) => "static-members",
            Self::Multicast(_) => "multicast",
            Self::Discovery(_) => "discovery",
        }
    }

    pub fn tcp_ip(&self) -> Option<&TcpIpConfig> {
        match self {
            Self::StaticMembers(tcp) => Some(tcp),
            _ => None,
        }
    }

    pub fn multicast(&self) -> Option<&MulticastConfig> {
        match self {
            Self::Multicast(multicast) => Some(multicast),
            _ => None,
        }
    }

    pub fn discovery(&self) -> Option<&DiscoveryStrategyConfig> {
        match self {
            Self::Discovery(discovery) => Some(discovery),
            _ => None,
        }
    }
}

/// Join through a fixed list of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpIpConfig {
    pub members: Vec<String>,
    pub connection_timeout_secs: u64,
}

/// Join by multicast broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastConfig {
    pub group: String,
    pub port: u16,
    pub time_to_live: u32,
    pub timeout_secs: u64,
    /// Interfaces allowed to answer. Empty means unrestricted.
    pub trusted_interfaces: BTreeSet<String>,
}

/// Strategy-specific settings returned by a discovery provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStrategyConfig {
    /// Identifier of the strategy the runtime should load.
    pub strategy: String,
    pub properties: BTreeMap<String, String>,
}

impl DiscoveryStrategyConfig {
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// Maps
// ============================================================================

/// Settings for one named cache region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    pub(crate) name: String,
    pub(crate) max_idle_seconds: u32,
    pub(crate) backup_count: u32,
    pub(crate) async_backup_count: u32,
    pub(crate) eviction_policy: EvictionPolicy,
    pub(crate) max_size: MaxSizeConfig,
}

impl MapSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seconds an entry may stay untouched before it expires.
    pub fn max_idle_seconds(&self) -> u32 {
        self.max_idle_seconds
    }

    pub fn backup_count(&self) -> u32 {
        self.backup_count
    }

    pub fn async_backup_count(&self) -> u32 {
        self.async_backup_count
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.eviction_policy
    }

    pub fn max_size(&self) -> &MaxSizeConfig {
        &self.max_size
    }

    /// Reject blank names, too many backups and percentages above 100.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "map name",
                reason: "must not be blank".to_string(),
            });
        }

        let total = self.backup_count.saturating_add(self.async_backup_count);
        if total > MAX_BACKUP_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "backup count",
                reason: format!(
                    "{} sync + {} async exceeds {MAX_BACKUP_COUNT}",
                    self.backup_count, self.async_backup_count
                ),
            });
        }

        let MaxSizeConfig { policy, size } = self.max_size;
        if policy.is_percentage() && size > 100 {
            return Err(ConfigError::InvalidValue {
                field: "max heap size percentage",
                reason: format!("{size} is above 100 for {policy}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxSizeConfig {
    pub policy: MaxSizePolicy,
    pub size: u32,
}

// ============================================================================
// Partition grouping
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionGroupConfig {
    group_type: Option<MemberGroupType>,
}

impl PartitionGroupConfig {
    pub(crate) fn enabled(group_type: MemberGroupType) -> Self {
        Self {
            group_type: Some(group_type),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.group_type.is_some()
    }

    pub fn group_type(&self) -> Option<MemberGroupType> {
        self.group_type
    }
}

// ============================================================================
// Shared checks
// ============================================================================

/// Every key must name its own map and every map must be valid.
pub(crate) fn validate_map_configs(
    maps: &BTreeMap<String, MapSpec>,
) -> Result<(), ConfigError> {
    for (key, spec) in maps {
        if key != spec.name() {
            return Err(ConfigError::InvalidValue {
                field: "map configs",
                reason: format!("key {key:?} holds map {:?}", spec.name()),
            });
        }
        spec.validate()?;
    }
    Ok(())
}

/// The group must be a multicast address and the TTL must fit in one byte.
pub(crate) fn validate_multicast_endpoint(
    group: &str,
    time_to_live: u32,
) -> Result<(), ConfigError> {
    match group.parse::<IpAddr>() {
        Ok(addr) if addr.is_multicast() => {}
        _ => {
            return Err(ConfigError::InvalidValue {
                field: "multicast group",
                reason: format!("{group:?} is not a multicast address"),
            })
        }
    }

    if time_to_live > MAX_MULTICAST_TTL {
        return Err(ConfigError::InvalidValue {
            field: "multicast time-to-live",
            reason: format!("{time_to_live} is above {MAX_MULTICAST_TTL}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_strategy_accessors() {
        let join = JoinStrategy::StaticMembers(TcpIpConfig {
            members: vec!["10.0.0.1".to_string()],
            connection_timeout_secs: 5,
        });
        assert_eq!(join.kind(), "static-members");
        assert!(join.tcp_ip().is_some());
        assert!(join.multicast().is_none());
        assert!(join.discovery().is_none());
    }

    #[test]
    fn test_partition_group_default_is_disabled() {
        let group = PartitionGroupConfig::default();
        assert!(!group.is_enabled());
        assert_eq!(group.group_type(), None);

        let group = PartitionGroupConfig::enabled(MemberGroupType::ZoneAware);
        assert!(group.is_enabled());
        assert_eq!(group.group_type(), Some(MemberGroupType::ZoneAware));
    }

    fn map_spec(name: &str, backups: (u32, u32), size: u32) -> MapSpec {
        MapSpec {
            name: name.to_string(),
            max_idle_seconds: 60,
            backup_count: backups.0,
            async_backup_count: backups.1,
            eviction_policy: EvictionPolicy::Lru,
            max_size: MaxSizeConfig {
                policy: MaxSizePolicy::UsedHeapPercentage,
                size,
            },
        }
    }

    fn static_network() -> NetworkConfig {
        NetworkConfig {
            port: 5701,
            port_auto_increment: true,
            join: JoinStrategy::StaticMembers(TcpIpConfig {
                members: vec!["localhost".to_string()],
                connection_timeout_secs: 5,
            }),
        }
    }

    #[test]
    fn test_map_spec_validate() {
        assert!(map_spec("tickets", (4, 2), 100).validate().is_ok());
        assert!(matches!(
            map_spec("  ", (1, 0), 85).validate(),
            Err(ConfigError::InvalidValue { field: "map name", .. })
        ));
        assert!(matches!(
            map_spec("tickets", (4, 3), 85).validate(),
            Err(ConfigError::InvalidValue { field: "backup count", .. })
        ));
        assert!(matches!(
            map_spec("tickets", (u32::MAX, u32::MAX), 85).validate(),
            Err(ConfigError::InvalidValue { field: "backup count", .. })
        ));
        assert!(matches!(
            map_spec("tickets", (1, 0), 101).validate(),
            Err(ConfigError::InvalidValue { field: "max heap size percentage", .. })
        ));
    }

    #[test]
    fn test_from_msgpack_validates_maps() {
        let maps = BTreeMap::from([("".to_string(), map_spec("", (200, 200), 9999))]);
        let config = ClusterConfig::new(
            "localhost".to_string(),
            static_network(),
            maps,
            PartitionGroupConfig::default(),
            BTreeMap::new(),
        );
        let bytes = config.to_msgpack().unwrap();
        assert!(matches!(
            ClusterConfig::from_msgpack(&bytes),
            Err(ConfigError::InvalidValue { field: "map name", .. })
        ));

        let maps = BTreeMap::from([("sessions".to_string(), map_spec("tickets", (1, 0), 85))]);
        let config = ClusterConfig::new(
            "localhost".to_string(),
            static_network(),
            maps,
            PartitionGroupConfig::default(),
            BTreeMap::new(),
        );
        let bytes = config.to_msgpack().unwrap();
        assert!(matches!(
            ClusterConfig::from_msgpack(&bytes),
            Err(ConfigError::InvalidValue { field: "map configs", .. })
        ));
    }

    #[test]
    fn test_from_msgpack_validates_multicast() {
        let mut network = static_network();
        network.join = JoinStrategy::Multicast(MulticastConfig {
            group: "224.2.2.3".to_string(),
            port: 54327,
            time_to_live: 300,
            timeout_secs: 2,
            trusted_interfaces: BTreeSet::new(),
        });
        let config = ClusterConfig::new(
            "localhost".to_string(),
            network,
            BTreeMap::new(),
            PartitionGroupConfig::default(),
            BTreeMap::new(),
        );
        let bytes = config.to_msgpack().unwrap();
        assert!(matches!(
            ClusterConfig::from_msgpack(&bytes),
            Err(ConfigError::InvalidValue { field: "multicast time-to-live", .. })
        ));
    }

    #[test]
    fn test_multicast_endpoint_checks() {
        assert!(validate_multicast_endpoint("224.2.2.3", 255).is_ok());
        assert!(validate_multicast_endpoint("ff02::1", 1).is_ok());
        assert!(validate_multicast_endpoint("10.0.0.1", 1).is_err());
        assert!(validate_multicast_endpoint("224.2.2.3", 256).is_err());
    }

    #[test]
    fn test_network_join_accessor() {
        let network = static_network();
        assert_eq!(network.join().kind(), "static-members");
    }

    #[test]
    fn test_from_msgpack_rejects_garbage() {
        assert!(matches!(
            ClusterConfig::from_msgpack(b"\xc1not msgpack"),
            Err(ConfigError::Decode(_))
        ));
    }
}
