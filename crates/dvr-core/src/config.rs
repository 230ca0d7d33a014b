use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Serde helper to serialize/deserialize `std::time::Duration` as seconds (u64).
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

/// How a router shapes advertisements sent back toward a route's next hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopSuppression {
    /// Advertise every route on every port.
    #[default]
    None,
    /// Never advertise a route out of the port it was learned on.
    SplitHorizon,
    /// Advertise a route out of the port it was learned on as unreachable.
    PoisonReverse,
}

impl LoopSuppression {
    /// Map a pair of independent on/off switches onto a single mode.
    ///
    /// Fails if both are set.
    pub fn from_flags(split_horizon: bool, poison_reverse: bool) -> Result<Self, CoreError> {
        match (split_horizon, poison_reverse) {
            (true, true) => Err(CoreError::ConflictingLoopSuppression),
            (true, false) => Ok(Self::SplitHorizon),
            (false, true) => Ok(Self::PoisonReverse),
            (false, false) => Ok(Self::None),
        }
    }
}

/// Static configuration of a distance-vector router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// How long a learned route lives without being refreshed.
    #[serde(with = "duration_secs", default = "default_route_ttl")]
    pub route_ttl: Duration,
    /// Latency ceiling. Paths at or above it are treated as unreachable.
    #[serde(default = "default_infinity")]
    pub infinity: u64,
    /// Split horizon / poison reverse selection.
    #[serde(default)]
    pub loop_suppression: LoopSuppression,
    /// Poison expired routes instead of deleting them.
    #[serde(default)]
    pub poison_expired: bool,
    /// Send the full table to a neighbor as soon as its link comes up.
    #[serde(default)]
    pub send_on_link_up: bool,
    /// Poison routes through a failed link instead of deleting them.
    #[serde(default)]
    pub poison_on_link_down: bool,
}

fn default_route_ttl() -> Duration {
    Duration::from_secs(15)
}
fn default_infinity() -> u64 {
    16
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            route_ttl: default_route_ttl(),
            infinity: default_infinity(),
            loop_suppression: LoopSuppression::None,
            poison_expired: false,
            send_on_link_up: false,
            poison_on_link_down: false,
        }
    }
}

impl RouterConfig {
    /// Validate that all fields are within acceptable ranges.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.route_ttl.is_zero() {
            return Err(CoreError::InvalidConfig("route_ttl must be positive".into()));
        }
        if chrono::Duration::from_std(self.route_ttl).is_err() {
            return Err(CoreError::InvalidConfig(format!(
                "route_ttl out of range: {}s",
                self.route_ttl.as_secs()
            )));
        }
        if self.infinity == 0 {
            return Err(CoreError::InvalidConfig("infinity must be positive".into()));
        }
        Ok(())
    }

    /// The route TTL as a signed duration for timestamp arithmetic.
    pub fn route_ttl_delta(&self) -> Result<chrono::Duration, CoreError> {
        chrono::Duration::from_std(self.route_ttl).map_err(|e| {
            CoreError::InvalidConfig(format!("route_ttl out of range: {}", e))
        })
    }
}
