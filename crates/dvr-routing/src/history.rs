use std::collections::HashMap;

use dvr_core::{Latency, NodeId, PortId};

/// Per-port memory of the last latency advertised for each destination.
///
/// Consulted only to suppress re-sending an unchanged value; it has no
/// authority over the routing table.
#[derive(Debug, Clone, Default)]
pub struct AdvertisementHistory {
    sent: HashMap<PortId, HashMap<NodeId, Latency>>,
}

impl AdvertisementHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last latency sent for `destination` on `port`, if any.
    pub fn last_sent(&self, port: PortId, destination: &NodeId) -> Option<Latency> {
        self.sent
            .get(&port)
            .and_then(|per_port| per_port.get(destination))
            .copied()
    }

    /// Whether sending `latency` for `destination` on `port` would repeat
    /// the previous advertisement.
    pub fn is_redundant(&self, port: PortId, destination: &NodeId, latency: Latency) -> bool {
        self.last_sent(port, destination) == Some(latency)
    }

    /// Create the (empty) history for `port` if it does not exist yet.
    pub fn ensure_port(&mut self, port: PortId) {
        self.sent.entry(port).or_default();
    }

    /// Remember that `latency` was sent for `destination` on `port`.
    pub fn record(&mut self, port: PortId, destination: NodeId, latency: Latency) {
        self.sent.entry(port).or_default().insert(destination, latency);
    }

    /// Forget everything sent on `port`. Returns the number of entries dropped.
    pub fn drop_port(&mut self, port: PortId) -> usize {
        self.sent.remove(&port).map_or(0, |per_port| per_port.len())
    }

    /// Whether any history (possibly empty) exists for `port`.
    pub fn has_port(&self, port: PortId) -> bool {
        self.sent.contains_key(&port)
    }

    /// Number of destinations remembered for `port`.
    pub fn entries_for(&self, port: PortId) -> usize {
        self.sent.get(&port).map_or(0, |per_port| per_port.len())
    }
}
