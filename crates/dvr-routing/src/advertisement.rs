use dvr_core::{Latency, LoopSuppression, NodeId, PortId};
use serde::{Deserialize, Serialize};

use crate::history::AdvertisementHistory;
use crate::table::{RouteEntry, RoutingTable};

/// A reachability announcement exchanged between neighboring routers:
/// "I can reach `destination` at `latency`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAdvertisement {
    /// The advertised destination.
    pub destination: NodeId,
    /// The sender's latency to the destination.
    pub latency: Latency,
}

impl RouteAdvertisement {
    pub fn new(destination: NodeId, latency: Latency) -> Self {
        Self {
            destination,
            latency,
        }
    }

    /// An advertisement announcing that `destination` is unreachable.
    pub fn poison(destination: NodeId) -> Self {
        Self::new(destination, Latency::Infinity)
    }
}

/// The latency to announce for `entry` on `port`, or `None` if the route
/// must not be announced there at all.
///
/// Split horizon withholds a route from the port it was learned on; poison
/// reverse announces it there as unreachable. Everywhere else the route's
/// own latency is announced, capped at `infinity`.
pub fn shape(
    entry: &RouteEntry,
    port: PortId,
    suppression: LoopSuppression,
    infinity: u64,
) -> Option<Latency> {
    let towards_next_hop = port == entry.next_hop;
    match suppression {
        LoopSuppression::SplitHorizon if towards_next_hop => None,
        LoopSuppression::PoisonReverse if towards_next_hop => Some(Latency::Infinity),
        _ => Some(entry.latency.capped(infinity)),
    }
}

/// The advertisements produced by one round, in send order.
#[derive(Debug, Clone, Default)]
pub struct AdvertisementRound {
    /// `(port, advertisement)` pairs to hand to the link layer.
    pub outgoing: Vec<(PortId, RouteAdvertisement)>,
    /// Advertisements skipped because the same value was already sent.
    pub suppressed: usize,
}

impl AdvertisementRound {
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }
}

/// Plan an advertisement round over `targets` and record every planned
/// send in `history`.
///
/// With `force`, every shaped route is sent regardless of history.
/// Otherwise a route is sent on a port only if its shaped value differs
/// from the last one sent there (or nothing was sent yet).
pub fn build_round(
    table: &RoutingTable,
    targets: &[PortId],
    history: &mut AdvertisementHistory,
    suppression: LoopSuppression,
    infinity: u64,
    force: bool,
) -> AdvertisementRound {
    let mut round = AdvertisementRound::default();

    for &port in targets {
        history.ensure_port(port);
        for (destination, entry) in table.iter() {
            let Some(latency) = shape(entry, port, suppression, infinity) else {
                continue;
            };
            if !force && history.is_redundant(port, destination, latency) {
                round.suppressed += 1;
                continue;
            }
            history.record(port, destination.clone(), latency);
            round
                .outgoing
                .push((port, RouteAdvertisement::new(destination.clone(), latency)));
        }
    }

    round
}
