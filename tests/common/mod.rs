//! Shared test helpers for clustercfg integration tests.
//!
//! Provides property fixtures for each join mode and a recording discovery
//! provider that counts how often it is resolved.

// Each test binary compiles this module independently and only uses a subset
// of exports, so unused items are expected.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clustercfg::{ClusterProperties, DiscoveryStrategyConfig, DiscoveryStrategyProvider};

// ============================================================================
// Property fixtures
// ============================================================================

/// TCP/IP join with an explicit member list.
pub fn static_member_props() -> ClusterProperties {
    ClusterProperties {
        instance_name: "cas-tickets".to_string(),
        members: vec!["10.0.0.1:5701".to_string(), "10.0.0.2:5701".to_string()],
        timeout: 7,
        ..ClusterProperties::default()
    }
}

/// Multicast join; TCP/IP turned off.
pub fn multicast_props(trusted_interfaces: &str) -> ClusterProperties {
    let mut props = ClusterProperties {
        tcpip_enabled: false,
        ..ClusterProperties::default()
    };
    props.multicast.enabled = true;
    props.multicast.group = "224.2.2.5".to_string();
    props.multicast.port = 54330;
    props.multicast.time_to_live = 4;
    props.multicast.timeout = 3;
    props.multicast.trusted_interfaces = trusted_interfaces.to_string();
    props
}

/// Discovery join. Leaves TCP/IP and multicast flags at whatever the caller sets.
pub fn discovery_props() -> ClusterProperties {
    let mut props = ClusterProperties::default();
    props.discovery.enabled = true;
    props
}

// ============================================================================
// RecordingProvider: test discovery provider
// ============================================================================

/// Returns a fixed strategy and counts resolutions.
pub struct RecordingProvider {
    name: String,
    calls: Arc<AtomicUsize>,
}

impl RecordingProvider {
    pub fn new(name: &str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name: name.to_string(),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl DiscoveryStrategyProvider for RecordingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, cluster: &ClusterProperties) -> anyhow::Result<DiscoveryStrategyConfig> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(DiscoveryStrategyConfig::new(format!("{}-strategy", self.name))
            .with_property("instance", cluster.instance_name.clone()))
    }
}

/// A provider that always fails.
pub struct FailingProvider;

impl DiscoveryStrategyProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn resolve(&self, _cluster: &ClusterProperties) -> anyhow::Result<DiscoveryStrategyConfig> {
        anyhow::bail!("metadata endpoint unreachable")
    }
}
