//! Results of a simulation run.

use std::collections::BTreeMap;
use std::fmt;

use dvr_core::NodeId;
use dvr_routing::{RouterStats, RoutingTable};
use serde::Serialize;

/// A packet that reached its destination host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Simulated second of arrival.
    pub at: i64,
    pub src: NodeId,
    pub dst: NodeId,
    /// Every node the packet visited, source and destination included.
    pub path: Vec<NodeId>,
}

/// Why a packet never arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossReason {
    /// A router had no usable route to the destination.
    NoRoute,
    /// The link was down when the packet was sent or while it was in flight.
    LinkDown,
    /// The packet visited too many nodes, most likely a forwarding loop.
    HopLimit,
    /// The packet reached a host it was not addressed to.
    Misdelivered,
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRoute => write!(f, "no route"),
            Self::LinkDown => write!(f, "link down"),
            Self::HopLimit => write!(f, "hop limit"),
            Self::Misdelivered => write!(f, "misdelivered"),
        }
    }
}

/// A packet that was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LostPacket {
    /// Simulated second of the drop.
    pub at: i64,
    pub src: NodeId,
    pub dst: NodeId,
    /// The node where the packet was dropped.
    pub node: NodeId,
    pub reason: LossReason,
}

/// Final state of one router.
#[derive(Debug, Clone, Serialize)]
pub struct RouterReport {
    pub table: RoutingTable,
    pub stats: RouterStats,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Simulated second the run stopped at.
    pub ended_at: i64,
    pub delivered: Vec<Delivery>,
    pub lost: Vec<LostPacket>,
    pub routers: BTreeMap<NodeId, RouterReport>,
}

impl SimReport {
    /// Render every routing table as text, one block per router.
    pub fn tables(&self) -> String {
        self.routers
            .iter()
            .map(|(id, r)| format!("== {} ==\n{}", id, r.table))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
