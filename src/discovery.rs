//! Pluggable discovery strategy providers.
//!
//! Deployments register providers in a [`DiscoveryRegistry`] and hand it to the
//! builder. Two providers ship with the crate:
//!
//! - **Kubernetes**: DNS lookup of a headless service, or API lookup by namespace.
//! - **Multicast**: multicast discovery driven by the cluster's multicast settings.

use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{debug, warn};

use crate::model::{validate_multicast_endpoint, DiscoveryStrategyConfig};
use crate::properties::ClusterProperties;
use crate::ConfigError;

/// Resolves a discovery strategy from the cluster properties.
pub trait DiscoveryStrategyProvider: Send + Sync + 'static {
    /// Name used to select this provider via `discovery.provider`.
    fn name(&self) -> &str;

    /// Produce the strategy settings for this cluster.
    fn resolve(&self, cluster: &ClusterProperties) -> anyhow::Result<DiscoveryStrategyConfig>;
}

// ============================================================================
// DiscoveryRegistry
// ============================================================================

/// Ordered set of registered providers.
#[derive(Clone, Default)]
pub struct DiscoveryRegistry {
    providers: Vec<Arc<dyn DiscoveryStrategyProvider>>,
}

impl fmt::Debug for DiscoveryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: impl DiscoveryStrategyProvider) {
        self.providers.push(Arc::new(provider));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_provider(mut self, provider: impl DiscoveryStrategyProvider) -> Self {
        self.register(provider);
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Pick the provider to use.
    ///
    /// With `requested` set, the provider of that name is returned. Otherwise
    /// the registry must hold exactly one provider; several providers without
    /// a selection are reported as ambiguous rather than picked by order.
    pub fn select(
        &self,
        requested: Option<&str>,
    ) -> Result<&dyn DiscoveryStrategyProvider, ConfigError> {
        if let Some(name) = requested {
            return self
                .providers
                .iter()
                .find(|p| p.name() == name)
                .map(|p| &**p)
                .ok_or_else(|| ConfigError::UnknownDiscoveryProvider {
                    name: name.to_string(),
                    available: self.names(),
                });
        }

        match self.providers.as_slice() {
            [] => Err(ConfigError::NoDiscoveryProvider),
            [only] => Ok(&**only),
            _ => {
                let providers = self.names();
                warn!(
                    ?providers,
                    "Multiple discovery providers registered and none selected"
                );
                Err(ConfigError::AmbiguousDiscoveryProvider { providers })
            }
        }
    }
}

// ============================================================================
// Built-in providers
// ============================================================================

/// Kubernetes discovery.
///
/// Uses DNS mode when `service-dns` is set in the discovery properties,
/// otherwise API mode, which needs `namespace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubernetesDiscovery;

impl KubernetesDiscovery {
    pub const NAME: &'static str = "kubernetes";

    const API_KEYS: [&'static str; 3] =
        ["service-name", "service-label-name", "service-label-value"];
}

impl DiscoveryStrategyProvider for KubernetesDiscovery {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn resolve(&self, cluster: &ClusterProperties) -> anyhow::Result<DiscoveryStrategyConfig> {
        let settings = &cluster.discovery.properties;
        let port = match settings.get("service-port") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("invalid service-port {port:?}"))?,
            None => cluster.port,
        };
        let config = DiscoveryStrategyConfig::new(Self::NAME)
            .with_property("service-port", port.to_string());

        if let Some(dns) = settings.get("service-dns") {
            let timeout = settings
                .get("service-dns-timeout")
                .cloned()
                .unwrap_or_else(|| cluster.timeout.to_string());
            debug!(service_dns = %dns, port, "Kubernetes discovery in DNS mode");
            return Ok(config
                .with_property("service-dns", dns.clone())
                .with_property("service-dns-timeout", timeout));
        }

        let Some(namespace) = settings.get("namespace") else {
            bail!("kubernetes discovery needs either service-dns or namespace");
        };
        debug!(%namespace, port, "Kubernetes discovery in API mode");

        let mut config = config.with_property("namespace", namespace.clone());
        for key in Self::API_KEYS {
            if let Some(value) = settings.get(key) {
                config = config.with_property(key, value.clone());
            }
        }
        Ok(config)
    }
}

/// Multicast discovery using the cluster's multicast group and port.
#[derive(Debug, Clone, Copy, Default)]
pub struct MulticastDiscovery;

impl MulticastDiscovery {
    pub const NAME: &'static str = "multicast";
}

impl DiscoveryStrategyProvider for MulticastDiscovery {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn resolve(&self, cluster: &ClusterProperties) -> anyhow::Result<DiscoveryStrategyConfig> {
        let multicast = &cluster.multicast;
        let group = multicast.group.trim();
        if group.is_empty() {
            bail!("multicast discovery needs a multicast group");
        }
        validate_multicast_endpoint(group, multicast.time_to_live)?;
        Ok(DiscoveryStrategyConfig::new(Self::NAME)
            .with_property("group", group)
            .with_property("port", multicast.port.to_string()))
    }
}
