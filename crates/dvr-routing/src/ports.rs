use std::collections::BTreeMap;

use dvr_core::{Latency, PortId};

/// The ports whose links are currently up, with each link's latency.
///
/// A port that is absent is down. Only the link-up and link-down handlers
/// mutate the registry.
#[derive(Debug, Clone, Default)]
pub struct PortRegistry {
    links: BTreeMap<PortId, Latency>,
}

impl PortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the link on `port` is up with the given latency.
    /// Returns the previous latency if the port was already up.
    pub fn add_port(&mut self, port: PortId, latency: Latency) -> Option<Latency> {
        self.links.insert(port, latency)
    }

    /// Forget `port`. Returns its latency if it was up.
    pub fn remove_port(&mut self, port: PortId) -> Option<Latency> {
        self.links.remove(&port)
    }

    /// Latency of the link on `port`, or `None` if the link is down.
    pub fn latency(&self, port: PortId) -> Option<Latency> {
        self.links.get(&port).copied()
    }

    pub fn contains(&self, port: PortId) -> bool {
        self.links.contains_key(&port)
    }

    /// All ports that are up, in ascending order.
    pub fn ports(&self) -> Vec<PortId> {
        self.links.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}
