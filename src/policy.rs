//! Named policies recognized by the cache runtime.
//!
//! Eviction and max-size policy names match exactly; partition group types
//! are matched case-insensitively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which entries go first once a map reaches its size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvictionPolicy {
    Lru,
    Lfu,
    None,
    Random,
}

/// How a map's size limit is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaxSizePolicy {
    PerNode,
    PerPartition,
    UsedHeapPercentage,
    UsedHeapSize,
    FreeHeapPercentage,
    FreeHeapSize,
    UsedNativeMemorySize,
    UsedNativeMemoryPercentage,
    FreeNativeMemorySize,
    FreeNativeMemoryPercentage,
}

/// How members are grouped for replica placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberGroupType {
    HostAware,
    Custom,
    PerMember,
    ZoneAware,
    Spi,
}

impl EvictionPolicy {
    pub const ALL: [Self; 4] = [Self::Lru, Self::Lfu, Self::None, Self::Random];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lru => "LRU",
            Self::Lfu => "LFU",
            Self::None => "NONE",
            Self::Random => "RANDOM",
        }
    }
}

impl MaxSizePolicy {
    pub const ALL: [Self; 10] = [
        Self::PerNode,
        Self::PerPartition,
        Self::UsedHeapPercentage,
        Self::UsedHeapSize,
        Self::FreeHeapPercentage,
        Self::FreeHeapSize,
        Self::UsedNativeMemorySize,
        Self::UsedNativeMemoryPercentage,
        Self::FreeNativeMemorySize,
        Self::FreeNativeMemoryPercentage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerNode => "PER_NODE",
            Self::PerPartition => "PER_PARTITION",
            Self::UsedHeapPercentage => "USED_HEAP_PERCENTAGE",
            Self::UsedHeapSize => "USED_HEAP_SIZE",
            Self::FreeHeapPercentage => "FREE_HEAP_PERCENTAGE",
            Self::FreeHeapSize => "FREE_HEAP_SIZE",
            Self::UsedNativeMemorySize => "USED_NATIVE_MEMORY_SIZE",
            Self::UsedNativeMemoryPercentage => "USED_NATIVE_MEMORY_PERCENTAGE",
            Self::FreeNativeMemorySize => "FREE_NATIVE_MEMORY_SIZE",
            Self::FreeNativeMemoryPercentage => "FREE_NATIVE_MEMORY_PERCENTAGE",
        }
    }

    /// Returns true if the size threshold is a percentage (0-100).
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            Self::UsedHeapPercentage
                | Self::FreeHeapPercentage
                | Self::UsedNativeMemoryPercentage
                | Self::FreeNativeMemoryPercentage
        )
    }
}

impl MemberGroupType {
    pub const ALL: [Self; 5] = [
        Self::HostAware,
        Self::Custom,
        Self::PerMember,
        Self::ZoneAware,
        Self::Spi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostAware => "HOST_AWARE",
            Self::Custom => "CUSTOM",
            Self::PerMember => "PER_MEMBER",
            Self::ZoneAware => "ZONE_AWARE",
            Self::Spi => "SPI",
        }
    }
}

fn lookup<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    name: fn(&T) -> &'static str,
    ignore_case: bool,
) -> Result<T, ConfigError> {
    all.iter()
        .find(|candidate| {
            if ignore_case {
                name(candidate).eq_ignore_ascii_case(value)
            } else {
                name(candidate) == value
            }
        })
        .copied()
        .ok_or_else(|| ConfigError::InvalidEnumValue {
            kind,
            value: value.to_string(),
        })
}

impl FromStr for EvictionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("eviction policy", s, &Self::ALL, Self::as_str, false)
    }
}

impl FromStr for MaxSizePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("max-size policy", s, &Self::ALL, Self::as_str, false)
    }
}

impl FromStr for MemberGroupType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("partition member group type", s.trim(), &Self::ALL, Self::as_str, true)
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MaxSizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MemberGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
