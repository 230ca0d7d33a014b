use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use dvr_core::{Expiry, Latency, NodeId, PortId};
use serde::{Deserialize, Serialize};

/// A single entry in the routing table: the best known way to reach
/// `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// The destination this entry can reach.
    pub destination: NodeId,
    /// Local port the route leaves through.
    pub next_hop: PortId,
    /// Total latency to the destination through `next_hop`.
    pub latency: Latency,
    /// When this entry stops being trusted.
    pub expiry: Expiry,
}

impl RouteEntry {
    /// Entry for a directly attached host. Never expires.
    pub fn static_route(destination: NodeId, port: PortId, latency: Latency) -> Self {
        Self {
            destination,
            next_hop: port,
            latency,
            expiry: Expiry::Forever,
        }
    }

    /// Returns true if this entry has expired relative to `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_expired(now)
    }

    /// The same route marked unreachable with a new expiry.
    pub fn poisoned(&self, expiry: Expiry) -> Self {
        Self {
            destination: self.destination.clone(),
            next_hop: self.next_hop,
            latency: Latency::Infinity,
            expiry,
        }
    }
}

/// The set of best-known routes, one per destination.
///
/// Iteration is ordered by destination so advertisement rounds are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable {
    routes: BTreeMap<NodeId, RouteEntry>,
}

impl RoutingTable {
    /// Create a new, empty routing table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The route to `destination`, if one is known.
    pub fn get(&self, destination: &NodeId) -> Option<&RouteEntry> {
        self.routes.get(destination)
    }

    /// Insert or overwrite the route for `entry.destination`. Returns the
    /// previous entry for that destination.
    pub fn insert(&mut self, entry: RouteEntry) -> Option<RouteEntry> {
        self.routes.insert(entry.destination.clone(), entry)
    }

    /// Remove the route for `destination`. Returns the removed entry if it existed.
    pub fn remove(&mut self, destination: &NodeId) -> Option<RouteEntry> {
        self.routes.remove(destination)
    }

    /// Iterate over all routes in destination order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &RouteEntry)> {
        self.routes.iter()
    }

    /// Total number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// All destinations present in the table, sorted.
    pub fn destinations(&self) -> Vec<NodeId> {
        self.routes.keys().cloned().collect()
    }

    /// Destinations whose route leaves through `port`.
    pub fn routes_via(&self, port: PortId) -> Vec<NodeId> {
        self.routes
            .values()
            .filter(|e| e.next_hop == port)
            .map(|e| e.destination.clone())
            .collect()
    }

    /// Destinations whose route has expired at `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<NodeId> {
        self.routes
            .values()
            .filter(|e| e.is_expired(now))
            .map(|e| e.destination.clone())
            .collect()
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {:>6} {:>8}  {}", "destination", "port", "latency", "expiry")?;
        for entry in self.routes.values() {
            writeln!(
                f,
                "{:<16} {:>6} {:>8}  {}",
                entry.destination, entry.next_hop, entry.latency, entry.expiry
            )?;
        }
        Ok(())
    }
}
