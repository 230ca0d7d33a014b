//! The distance-vector routing engine.
//!
//! [`DvRouter`] owns the routing table and advertisement history of one
//! node and reacts to the events delivered by its host: static routes for
//! attached hosts, data packets, neighbor advertisements, periodic ticks,
//! and link state changes. Every handler runs to completion; table changes
//! made inside a handler are visible to the advertisement round it triggers.

use chrono::Duration;
use dvr_core::{DataPacket, Expiry, Latency, NodeId, PortId, RouterConfig};
use serde::{Deserialize, Serialize};

use crate::advertisement::{build_round, RouteAdvertisement};
use crate::clock::Clock;
use crate::error::RoutingError;
use crate::history::AdvertisementHistory;
use crate::link::LinkLayer;
use crate::ports::PortRegistry;
use crate::table::{RouteEntry, RoutingTable};

/// Inbound events a routing node reacts to.
pub trait RoutingNode {
    /// A host is directly attached on `port`. Fails if the link on `port`
    /// is not up.
    fn install_static_route(&mut self, host: NodeId, port: PortId) -> Result<(), RoutingError>;

    /// A data packet arrived on `in_port`.
    fn on_data_packet(&mut self, packet: DataPacket, in_port: PortId);

    /// Periodic maintenance: expire stale routes and advertise the full table.
    fn on_periodic_tick(&mut self);

    /// A neighbor on `in_port` advertised a route.
    fn on_advertisement(&mut self, advert: RouteAdvertisement, in_port: PortId);

    /// The link on `port` came up with the given latency.
    fn on_link_up(&mut self, port: PortId, latency: Latency);

    /// The link on `port` went down.
    fn on_link_down(&mut self, port: PortId);
}

/// Counters describing what a router has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStats {
    pub adverts_sent: u64,
    pub adverts_suppressed: u64,
    pub adverts_received: u64,
    pub adverts_ignored: u64,
    pub packets_forwarded: u64,
    pub packets_dropped: u64,
    pub routes_expired: u64,
}

/// A distance-vector router.
///
/// Generic over its clock and link layer so the same engine runs against
/// a simulator, a test harness, or a real transport.
pub struct DvRouter<C, L> {
    id: NodeId,
    config: RouterConfig,
    route_ttl: Duration,
    clock: C,
    link: L,
    ports: PortRegistry,
    table: RoutingTable,
    history: AdvertisementHistory,
    stats: RouterStats,
}

impl<C: Clock, L: LinkLayer> DvRouter<C, L> {
    /// Create a router with an empty table and no links.
    pub fn new(id: NodeId, config: RouterConfig, clock: C, link: L) -> Result<Self, RoutingError> {
        config.validate()?;
        let route_ttl = config.route_ttl_delta()?;
        Ok(Self {
            id,
            config,
            route_ttl,
            clock,
            link,
            ports: PortRegistry::new(),
            table: RoutingTable::new(),
            history: AdvertisementHistory::new(),
            stats: RouterStats::default(),
        })
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn ports(&self) -> &PortRegistry {
        &self.ports
    }

    pub fn history(&self) -> &AdvertisementHistory {
        &self.history
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    pub fn link_layer(&self) -> &L {
        &self.link
    }

    pub fn link_layer_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn fresh_expiry(&self) -> Expiry {
        Expiry::after(self.clock.now(), self.route_ttl)
    }

    /// Run an advertisement round over `single_port`, or every up port if
    /// `None`.
    ///
    /// A forced round sends every route; otherwise only values that differ
    /// from what was last sent on each port go out.
    pub fn send_routes(&mut self, force: bool, single_port: Option<PortId>) {
        let targets = match single_port {
            Some(port) => vec![port],
            None => self.ports.ports(),
        };
        let round = build_round(
            &self.table,
            &targets,
            &mut self.history,
            self.config.loop_suppression,
            self.config.infinity,
            force,
        );

        tracing::trace!(
            router = %self.id,
            force,
            sent = round.outgoing.len(),
            suppressed = round.suppressed,
            "advertisement round"
        );

        self.stats.adverts_suppressed += round.suppressed as u64;
        self.stats.adverts_sent += round.outgoing.len() as u64;
        for (port, advert) in round.outgoing {
            self.link.send_advertisement(port, advert);
        }
    }

    /// Drop or poison every route whose expiry has passed. Returns the
    /// number of routes affected.
    ///
    /// With `poison_expired`, every expired route is replaced by an
    /// unreachable one that lives for another TTL.
    pub fn expire_routes(&mut self) -> usize {
        let now = self.clock.now();
        let expired = self.table.expired(now);

        for destination in &expired {
            let Some(entry) = self.table.get(destination) else {
                continue;
            };
            if self.config.poison_expired {
                let poisoned = entry.poisoned(self.fresh_expiry());
                tracing::debug!(router = %self.id, %destination, "route expired, poisoning");
                self.table.insert(poisoned);
            } else {
                tracing::debug!(router = %self.id, %destination, "route expired, removing");
                self.table.remove(destination);
            }
        }

        self.stats.routes_expired += expired.len() as u64;
        expired.len()
    }

    /// Apply the distance-vector decision rule to one advertisement.
    /// Returns true if the table changed in a way neighbors should hear about.
    fn update_route(&mut self, advert: &RouteAdvertisement, in_port: PortId, neighbor_cost: Latency) -> bool {
        let candidate = neighbor_cost
            .saturating_add(advert.latency)
            .capped(self.config.infinity);
        let replacement = RouteEntry {
            destination: advert.destination.clone(),
            next_hop: in_port,
            latency: candidate,
            expiry: self.fresh_expiry(),
        };

        match self.table.get(&advert.destination) {
            None => {
                tracing::debug!(
                    router = %self.id,
                    destination = %advert.destination,
                    port = %in_port,
                    latency = %candidate,
                    "new route"
                );
                self.table.insert(replacement);
                true
            }
            Some(existing) if existing.next_hop == in_port => {
                let changed = existing.latency != candidate;
                if changed {
                    tracing::debug!(
                        router = %self.id,
                        destination = %advert.destination,
                        port = %in_port,
                        old = %existing.latency,
                        new = %candidate,
                        "next hop changed route latency"
                    );
                }
                self.table.insert(replacement);
                changed
            }
            Some(existing) if candidate < existing.latency => {
                tracing::debug!(
                    router = %self.id,
                    destination = %advert.destination,
                    old_port = %existing.next_hop,
                    new_port = %in_port,
                    old = %existing.latency,
                    new = %candidate,
                    "switching to better next hop"
                );
                self.table.insert(replacement);
                true
            }
            Some(_) => false,
        }
    }
}

impl<C: Clock, L: LinkLayer> RoutingNode for DvRouter<C, L> {
    fn install_static_route(&mut self, host: NodeId, port: PortId) -> Result<(), RoutingError> {
        let latency = self
            .ports
            .latency(port)
            .ok_or(RoutingError::LinkDown { port })?;

        tracing::info!(router = %self.id, %host, %port, %latency, "static route installed");
        self.table
            .insert(RouteEntry::static_route(host, port, latency));
        Ok(())
    }

    fn on_data_packet(&mut self, packet: DataPacket, in_port: PortId) {
        let route = self
            .table
            .get(&packet.dst)
            .filter(|e| e.latency.capped(self.config.infinity).is_finite())
            .map(|e| e.next_hop);

        match route {
            Some(out_port) => {
                tracing::trace!(
                    router = %self.id,
                    dst = %packet.dst,
                    %in_port,
                    %out_port,
                    "forwarding packet"
                );
                self.stats.packets_forwarded += 1;
                self.link.forward_packet(out_port, packet);
            }
            None => {
                tracing::debug!(router = %self.id, dst = %packet.dst, %in_port, "no route, dropping packet");
                self.stats.packets_dropped += 1;
            }
        }
    }

    fn on_periodic_tick(&mut self) {
        self.expire_routes();
        self.send_routes(true, None);
    }

    fn on_advertisement(&mut self, advert: RouteAdvertisement, in_port: PortId) {
        let Some(neighbor_cost) = self.ports.latency(in_port) else {
            tracing::warn!(
                router = %self.id,
                destination = %advert.destination,
                port = %in_port,
                "advertisement on a port that is down, ignoring"
            );
            self.stats.adverts_ignored += 1;
            return;
        };
        self.stats.adverts_received += 1;

        if self.update_route(&advert, in_port, neighbor_cost) {
            self.send_routes(false, None);
        }
    }

    fn on_link_up(&mut self, port: PortId, latency: Latency) {
        tracing::info!(router = %self.id, %port, %latency, "link up");
        self.ports.add_port(port, latency);

        if self.config.send_on_link_up {
            self.history.ensure_port(port);
            self.send_routes(true, Some(port));
        }
    }

    fn on_link_down(&mut self, port: PortId) {
        tracing::info!(router = %self.id, %port, "link down");
        self.ports.remove_port(port);
        self.history.drop_port(port);

        let affected = self.table.routes_via(port);
        for destination in &affected {
            if self.config.poison_on_link_down {
                if let Some(entry) = self.table.get(destination) {
                    let poisoned = entry.poisoned(self.fresh_expiry());
                    self.table.insert(poisoned);
                }
            } else {
                self.table.remove(destination);
            }
        }

        if !affected.is_empty() {
            tracing::debug!(
                router = %self.id,
                %port,
                routes = affected.len(),
                poisoned = self.config.poison_on_link_down,
                "routes through failed link invalidated"
            );
            self.send_routes(false, None);
        }
    }
}
