//! Assembles a [`ClusterConfig`] from [`ClusterProperties`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::discovery::DiscoveryRegistry;
use crate::model::{
    validate_map_configs, validate_multicast_endpoint, ClusterConfig, JoinStrategy, MapSpec,
    MaxSizeConfig, MulticastConfig, NetworkConfig, PartitionGroupConfig, TcpIpConfig,
    DISCOVERY_ENABLED_PROP, IPV4_STACK_PROP, LOGGING_TYPE_PROP, MAX_HEARTBEAT_SECONDS_PROP,
};
use crate::policy::{EvictionPolicy, MaxSizePolicy, MemberGroupType};
use crate::properties::{ClusterProperties, MulticastProperties};
use crate::ConfigError;

/// Builds cluster configurations.
///
/// Holds only the discovery registry, so one builder can be shared across
/// threads; every call returns a fresh, independently owned value.
#[derive(Debug, Clone, Default)]
pub struct ClusterConfigBuilder {
    registry: DiscoveryRegistry,
}

impl ClusterConfigBuilder {
    pub fn new(registry: DiscoveryRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    /// Build the settings for one cache region.
    ///
    /// Eviction policy, max-size policy and backup counts come from
    /// `properties`; the max-size threshold is `max_heap_size_percentage`.
    pub fn build_map_spec(
        &self,
        properties: &ClusterProperties,
        map_name: &str,
        idle_timeout_secs: u64,
    ) -> Result<MapSpec, ConfigError> {
        let eviction_policy: EvictionPolicy = properties.eviction_policy.parse()?;
        let max_size_policy: MaxSizePolicy = properties.max_size_policy.parse()?;

        let max_idle_seconds =
            u32::try_from(idle_timeout_secs).map_err(|_| ConfigError::InvalidValue {
                field: "idle timeout",
                reason: format!("{idle_timeout_secs}s exceeds {}s", u32::MAX),
            })?;

        let spec = MapSpec {
            name: map_name.to_string(),
            max_idle_seconds,
            backup_count: properties.backup_count,
            async_backup_count: properties.async_backup_count,
            eviction_policy,
            max_size: MaxSizeConfig {
                policy: max_size_policy,
                size: properties.max_heap_size_percentage,
            },
        };
        spec.validate()?;

        debug!(
            map = %map_name,
            idle_timeout_secs,
            %eviction_policy,
            %max_size_policy,
            size = spec.max_size.size,
            "Creating map configuration"
        );

        Ok(spec)
    }

    /// Assemble the full configuration for the given cache regions.
    ///
    /// `map_configs` must be keyed by each spec's own name. Every spec is
    /// checked again, since a `MapSpec` may also come from deserialization.
    pub fn build_cluster_config(
        &self,
        properties: &ClusterProperties,
        map_configs: BTreeMap<String, MapSpec>,
    ) -> Result<ClusterConfig, ConfigError> {
        validate_map_configs(&map_configs)?;

        let join = if properties.is_discovery_join() {
            self.discovery_join(properties)?
        } else {
            default_join(properties)?
        };
        debug!(strategy = join.kind(), "Created join configuration");

        let network = NetworkConfig {
            port: properties.port,
            port_auto_increment: properties.port_auto_increment,
            join,
        };
        debug!(
            port = network.port,
            port_auto_increment = network.port_auto_increment,
            "Created network configuration"
        );

        let partition_group = partition_group(properties)?;

        Ok(ClusterConfig::new(
            properties.instance_name.clone(),
            network,
            map_configs,
            partition_group,
            runtime_properties(properties),
        ))
    }

    /// [`build_cluster_config`](Self::build_cluster_config) for a single region.
    pub fn build_for_map(
        &self,
        properties: &ClusterProperties,
        map_spec: MapSpec,
    ) -> Result<ClusterConfig, ConfigError> {
        let mut map_configs = BTreeMap::new();
        map_configs.insert(map_spec.name().to_string(), map_spec);
        self.build_cluster_config(properties, map_configs)
    }

    fn discovery_join(&self, properties: &ClusterProperties) -> Result<JoinStrategy, ConfigError> {
        debug!("Disabling multicast and TCP/IP join for discovery");

        let provider = self
            .registry
            .select(properties.discovery.provider.as_deref())?;
        let strategy =
            provider
                .resolve(properties)
                .map_err(|e| ConfigError::DiscoveryProvider {
                    provider: provider.name().to_string(),
                    message: format!("{e:#}"),
                })?;

        debug!(
            provider = provider.name(),
            strategy = %strategy.strategy,
            "Created discovery strategy configuration"
        );
        Ok(JoinStrategy::Discovery(strategy))
    }
}

// ============================================================================
// Join helpers
// ============================================================================

fn default_join(properties: &ClusterProperties) -> Result<JoinStrategy, ConfigError> {
    match (properties.tcpip_enabled, properties.multicast.enabled) {
        (true, true) => Err(ConfigError::ConflictingJoinStrategies),
        (false, false) => Err(ConfigError::NoJoinStrategy),
        (true, false) => {
            let tcp_ip = TcpIpConfig {
                members: properties.members.clone(),
                connection_timeout_secs: properties.timeout,
            };
            debug!(
                members = ?tcp_ip.members,
                timeout_secs = tcp_ip.connection_timeout_secs,
                "Created TCP/IP configuration"
            );
            debug!("Skipped multicast configuration since multicast is disabled");
            Ok(JoinStrategy::StaticMembers(tcp_ip))
        }
        (false, true) => multicast_config(&properties.multicast).map(JoinStrategy::Multicast),
    }
}

fn multicast_config(multicast: &MulticastProperties) -> Result<MulticastConfig, ConfigError> {
    let group = multicast.group.trim();
    validate_multicast_endpoint(group, multicast.time_to_live)?;

    let config = MulticastConfig {
        group: group.to_string(),
        port: multicast.port,
        time_to_live: multicast.time_to_live,
        timeout_secs: multicast.timeout,
        trusted_interfaces: parse_trusted_interfaces(&multicast.trusted_interfaces),
    };
    debug!(
        group = %config.group,
        port = config.port,
        ttl = config.time_to_live,
        trusted_interfaces = ?config.trusted_interfaces,
        "Created multicast configuration"
    );
    Ok(config)
}

/// Split a comma-delimited interface list. Blank entries are dropped.
pub(crate) fn parse_trusted_interfaces(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Finishing
// ============================================================================

fn partition_group(properties: &ClusterProperties) -> Result<PartitionGroupConfig, ConfigError> {
    let Some(raw) = properties.partition_group_type() else {
        debug!("Partition grouping disabled");
        return Ok(PartitionGroupConfig::default());
    };

    let group_type: MemberGroupType = raw.parse()?;
    debug!(%group_type, "Using partition member group type");
    Ok(PartitionGroupConfig::enabled(group_type))
}

fn runtime_properties(properties: &ClusterProperties) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            DISCOVERY_ENABLED_PROP.to_string(),
            properties.discovery.enabled.to_string(),
        ),
        (
            IPV4_STACK_PROP.to_string(),
            properties.ipv4_enabled.to_string(),
        ),
        (
            LOGGING_TYPE_PROP.to_string(),
            properties.logging_type.clone(),
        ),
        (
            MAX_HEARTBEAT_SECONDS_PROP.to_string(),
            properties.max_no_heartbeat_seconds.to_string(),
        ),
    ])
}
