//! clustercfg: validated cluster configuration for in-memory data grids.
//!
//! Translates application-level [`ClusterProperties`] (topology, discovery,
//! eviction, map sizing) into an immutable [`ClusterConfig`] that a clustering
//! runtime can start from. No cache logic lives here; building is a pure,
//! synchronous transformation.
//!
//! # Quick start
//!
//! 1. Populate [`ClusterProperties`] from your settings source.
//! 2. Register any discovery providers in a [`DiscoveryRegistry`].
//! 3. Create a [`ClusterConfigBuilder`] and call
//!    [`build_map_spec`](ClusterConfigBuilder::build_map_spec) per cache region.
//! 4. Call [`build_cluster_config`](ClusterConfigBuilder::build_cluster_config)
//!    and hand the result to the runtime.

pub mod discovery;
pub mod model;
pub mod policy;
pub mod properties;

mod builder;

pub use builder::ClusterConfigBuilder;
pub use discovery::{
    DiscoveryRegistry, DiscoveryStrategyProvider, KubernetesDiscovery, MulticastDiscovery,
};
pub use model::{
    ClusterConfig, DiscoveryStrategyConfig, JoinStrategy, MapSpec, MaxSizeConfig,
    MulticastConfig, NetworkConfig, PartitionGroupConfig, TcpIpConfig,
};
pub use policy::{EvictionPolicy, MaxSizePolicy, MemberGroupType};
pub use properties::{ClusterProperties, DiscoveryProperties, MulticastProperties};

use thiserror::Error;

// ============================================================================
// ConfigError
// ============================================================================

/// Errors returned while building a configuration.
///
/// All of them are deployment errors: none is transient and none is retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Multiple discovery providers registered ({}) and none selected", .providers.join(", "))]
    AmbiguousDiscoveryProvider { providers: Vec<String> },
    #[error("TCP/IP and multicast join cannot both be enabled")]
    ConflictingJoinStrategies,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Discovery provider {provider} failed: {message}")]
    DiscoveryProvider { provider: String, message: String },
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Invalid {kind}: {value:?}")]
    InvalidEnumValue { kind: &'static str, value: String },
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Discovery is enabled but no discovery provider is registered")]
    NoDiscoveryProvider,
    /// TCP/IP, multicast and discovery are all off.
    ///
    /// A runtime given no join would start a standalone member; a
    /// configuration must name exactly one join, so this is rejected instead.
    #[error("No join strategy enabled (TCP/IP, multicast or discovery)")]
    NoJoinStrategy,
    #[error("Unknown discovery provider {name:?} (registered: {})", .available.join(", "))]
    UnknownDiscoveryProvider { name: String, available: Vec<String> },
}
