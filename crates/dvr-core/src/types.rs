use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::CoreError;

/// Opaque identifier of a node (router or host) in the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// The raw name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for NodeId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Local interface identifier. Only meaningful on the router that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub u32);

impl From<u32> for PortId {
    fn from(port: u32) -> Self {
        Self(port)
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Path or link latency with an explicit "unreachable" value.
///
/// Every finite latency orders below [`Latency::Infinity`], and addition
/// saturates instead of overflowing, so poisoned routes stay poisoned no
/// matter how many hops they travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Latency {
    /// A reachable destination at the given cost.
    Finite(u64),
    /// The destination is unreachable.
    Infinity,
}

impl Latency {
    /// Whether this latency marks an unreachable destination.
    pub fn is_infinite(&self) -> bool {
        matches!(self, Latency::Infinity)
    }

    /// Whether this latency is a concrete cost.
    pub fn is_finite(&self) -> bool {
        !self.is_infinite()
    }

    /// Add two latencies. `Infinity` absorbs everything and finite
    /// overflow saturates to `Infinity`.
    pub fn saturating_add(self, other: Latency) -> Latency {
        match (self, other) {
            (Latency::Finite(a), Latency::Finite(b)) => {
                a.checked_add(b).map_or(Latency::Infinity, Latency::Finite)
            }
            _ => Latency::Infinity,
        }
    }

    /// Treat every finite value at or above `ceiling` as unreachable.
    pub fn capped(self, ceiling: u64) -> Latency {
        match self {
            Latency::Finite(v) if v >= ceiling => Latency::Infinity,
            other => other,
        }
    }

    /// Parse a latency from its textual form: a non-negative integer or
    /// one of `inf` / `infinity`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("inf") || trimmed.eq_ignore_ascii_case("infinity") {
            return Ok(Latency::Infinity);
        }
        trimmed
            .parse::<u64>()
            .map(Latency::Finite)
            .map_err(|_| CoreError::InvalidLatency(s.to_string()))
    }
}

impl From<u64> for Latency {
    fn from(value: u64) -> Self {
        Latency::Finite(value)
    }
}

impl fmt::Display for Latency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Latency::Finite(v) => fmt::Display::fmt(v, f),
            Latency::Infinity => f.pad("inf"),
        }
    }
}

impl Serialize for Latency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Latency::Finite(v) => serializer.serialize_u64(*v),
            Latency::Infinity => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> Deserialize<'de> for Latency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Latency::Finite(v)),
            Repr::Text(s) => Latency::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// When a route stops being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    /// Never expires. Used for directly attached hosts.
    Forever,
    /// Expires at the given instant.
    At(DateTime<Utc>),
}

impl Expiry {
    /// An expiry `ttl` after `now`. Saturates to `Forever` if the
    /// resulting instant is not representable.
    pub fn after(now: DateTime<Utc>, ttl: Duration) -> Self {
        now.checked_add_signed(ttl)
            .map_or(Expiry::Forever, Expiry::At)
    }

    /// Returns true if this expiry has been reached at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Expiry::Forever => false,
            Expiry::At(t) => *t <= now,
        }
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Forever => write!(f, "forever"),
            Expiry::At(t) => write!(f, "{}", t.format("%H:%M:%S%.3f")),
        }
    }
}

/// A data packet travelling through the network.
///
/// The routing engine forwards packets unchanged; `trace` is filled in by
/// the link layer as the packet visits nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPacket {
    /// The node that originated the packet.
    pub src: NodeId,
    /// The node the packet is addressed to.
    pub dst: NodeId,
    /// Opaque application payload.
    pub payload: Bytes,
    /// Nodes the packet has visited, in order.
    pub trace: Vec<NodeId>,
}

impl DataPacket {
    /// Create a new packet with an empty trace.
    pub fn new(src: NodeId, dst: NodeId, payload: impl Into<Bytes>) -> Self {
        Self {
            src,
            dst,
            payload: payload.into(),
            trace: Vec::new(),
        }
    }

    /// Number of nodes visited so far.
    pub fn hop_count(&self) -> usize {
        self.trace.len()
    }
}
