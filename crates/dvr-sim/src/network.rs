//! Discrete-event network simulator.
//!
//! [`Network`] hosts a set of routers and hosts on a shared virtual clock.
//! Messages cross a link after its latency in seconds. Events are processed
//! one at a time in (time, insertion) order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use dvr_core::{DataPacket, Latency, NodeId, PortId, RouterConfig};
use dvr_routing::{
    Clock, DvRouter, ManualClock, Outbound, Outbox, RouteAdvertisement, RouteEntry, RoutingError,
    RoutingNode,
};

use crate::config::{Action, ScriptedEvent, SimConfig, SimSettings};
use crate::error::SimError;
use crate::report::{Delivery, LossReason, LostPacket, RouterReport, SimReport};

/// A router as run by the simulator.
pub type SimRouter = DvRouter<ManualClock, Outbox>;

/// Upper bound on any simulated offset, keeping timestamp arithmetic in range.
const MAX_SIM_SECS: u64 = 1 << 40;

fn sim_duration(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_SIM_SECS) as i64)
}

fn sim_time(secs: u64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + sim_duration(secs)
}

/// One side of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Endpoint {
    node: NodeId,
    port: PortId,
}

#[derive(Debug, Clone)]
struct Link {
    ends: [Endpoint; 2],
    latency: u64,
    up: bool,
    /// Bumped on every failure so in-flight messages from before it are lost.
    epoch: u64,
}

impl Link {
    fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (self.ends[0].node == *a && self.ends[1].node == *b)
            || (self.ends[0].node == *b && self.ends[1].node == *a)
    }

    fn end_of(&self, node: &NodeId) -> Option<&Endpoint> {
        self.ends.iter().find(|e| e.node == *node)
    }

    fn peer_of(&self, node: &NodeId) -> &Endpoint {
        if self.ends[0].node == *node {
            &self.ends[1]
        } else {
            &self.ends[0]
        }
    }
}

#[derive(Debug, Clone)]
enum Message {
    Advertisement(RouteAdvertisement),
    Packet(DataPacket),
}

#[derive(Debug, Clone)]
enum SimEvent {
    Deliver {
        link: usize,
        epoch: u64,
        to: Endpoint,
        message: Message,
    },
    Tick,
    Script(Action),
}

#[derive(Debug)]
struct Scheduled {
    at: DateTime<Utc>,
    seq: u64,
    event: SimEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so reverse to pop the earliest event first.
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A simulated network of routers and hosts.
pub struct Network {
    router_config: RouterConfig,
    settings: SimSettings,
    clock: ManualClock,
    routers: BTreeMap<NodeId, SimRouter>,
    /// Each host and the index of its single link, once it has one.
    hosts: BTreeMap<NodeId, Option<usize>>,
    links: Vec<Link>,
    port_index: HashMap<Endpoint, usize>,
    next_port: HashMap<NodeId, u32>,
    queue: BinaryHeap<Scheduled>,
    seq: u64,
    delivered: Vec<Delivery>,
    lost: Vec<LostPacket>,
}

impl Network {
    /// Create an empty network. Time starts at zero and the first periodic
    /// tick fires after one `tick_interval` (no ticks if the interval is 0).
    pub fn new(router_config: RouterConfig, settings: SimSettings) -> Result<Self, SimError> {
        router_config.validate().map_err(RoutingError::from)?;

        let mut network = Self {
            router_config,
            settings,
            clock: ManualClock::at_epoch(),
            routers: BTreeMap::new(),
            hosts: BTreeMap::new(),
            links: Vec::new(),
            port_index: HashMap::new(),
            next_port: HashMap::new(),
            queue: BinaryHeap::new(),
            seq: 0,
            delivered: Vec::new(),
            lost: Vec::new(),
        };
        if network.settings.tick_interval > 0 {
            let first = sim_time(network.settings.tick_interval);
            network.push(first, SimEvent::Tick);
        }
        Ok(network)
    }

    /// Build a network from a configuration: nodes, initial links, and
    /// scripted events.
    pub fn from_config(config: &SimConfig) -> Result<Self, SimError> {
        let mut network = Self::new(config.router.clone(), config.sim.clone())?;
        for name in &config.routers {
            network.add_router(name)?;
        }
        for name in &config.hosts {
            network.add_host(name)?;
        }
        for link in &config.links {
            network.add_link(&link.a, &link.b, link.latency)?;
        }
        for event in &config.events {
            network.schedule(event.clone())?;
        }
        tracing::info!(
            routers = network.routers.len(),
            hosts = network.hosts.len(),
            links = network.links.len(),
            events = config.events.len(),
            "network built"
        );
        Ok(network)
    }

    fn push(&mut self, at: DateTime<Utc>, event: SimEvent) {
        self.seq += 1;
        self.queue.push(Scheduled {
            at,
            seq: self.seq,
            event,
        });
    }

    /// Current simulated second.
    pub fn now(&self) -> i64 {
        self.clock.now().timestamp()
    }

    pub fn router(&self, name: &str) -> Option<&SimRouter> {
        self.routers.get(&NodeId::from(name))
    }

    /// The route `router` currently holds for `destination`.
    pub fn route(&self, router: &str, destination: &str) -> Option<&RouteEntry> {
        self.router(router)
            .and_then(|r| r.table().get(&NodeId::from(destination)))
    }

    /// Packets delivered so far, in arrival order.
    pub fn delivered(&self) -> &[Delivery] {
        &self.delivered
    }

    /// Packets dropped so far, in drop order.
    pub fn lost(&self) -> &[LostPacket] {
        &self.lost
    }

    fn ensure_unique(&self, id: &NodeId) -> Result<(), SimError> {
        if self.routers.contains_key(id) || self.hosts.contains_key(id) {
            return Err(SimError::DuplicateNode(id.to_string()));
        }
        Ok(())
    }

    fn ensure_known(&self, name: &str) -> Result<NodeId, SimError> {
        let id = NodeId::from(name);
        if self.routers.contains_key(&id) || self.hosts.contains_key(&id) {
            Ok(id)
        } else {
            Err(SimError::UnknownNode(name.to_string()))
        }
    }

    pub fn add_router(&mut self, name: &str) -> Result<(), SimError> {
        let id = NodeId::from(name);
        self.ensure_unique(&id)?;
        let router = DvRouter::new(
            id.clone(),
            self.router_config.clone(),
            self.clock.clone(),
            Outbox::new(),
        )?;
        self.routers.insert(id, router);
        Ok(())
    }

    pub fn add_host(&mut self, name: &str) -> Result<(), SimError> {
        let id = NodeId::from(name);
        self.ensure_unique(&id)?;
        self.hosts.insert(id, None);
        Ok(())
    }

    fn allocate_port(&mut self, node: &NodeId) -> PortId {
        let next = self.next_port.entry(node.clone()).or_insert(1);
        let port = PortId(*next);
        *next += 1;
        port
    }

    fn find_link(&self, a: &NodeId, b: &NodeId) -> Option<usize> {
        self.links.iter().position(|l| l.connects(a, b))
    }

    /// Connect two nodes and bring the link up immediately.
    pub fn add_link(&mut self, a: &str, b: &str, latency: u64) -> Result<(), SimError> {
        if a == b {
            return Err(SimError::SelfLink(a.to_string()));
        }
        let a_id = self.ensure_known(a)?;
        let b_id = self.ensure_known(b)?;
        if self.hosts.contains_key(&a_id) && self.hosts.contains_key(&b_id) {
            return Err(SimError::HostToHostLink {
                a: a.to_string(),
                b: b.to_string(),
            });
        }
        if self.find_link(&a_id, &b_id).is_some() {
            return Err(SimError::DuplicateLink {
                a: a.to_string(),
                b: b.to_string(),
            });
        }
        for id in [&a_id, &b_id] {
            if let Some(Some(_)) = self.hosts.get(id) {
                return Err(SimError::HostAlreadyLinked(id.to_string()));
            }
        }

        let idx = self.links.len();
        let ends = [
            Endpoint {
                port: self.allocate_port(&a_id),
                node: a_id,
            },
            Endpoint {
                port: self.allocate_port(&b_id),
                node: b_id,
            },
        ];
        for end in &ends {
            self.port_index.insert(end.clone(), idx);
            if let Some(slot) = self.hosts.get_mut(&end.node) {
                *slot = Some(idx);
            }
        }
        self.links.push(Link {
            ends,
            latency,
            up: false,
            epoch: 0,
        });
        self.bring_up(idx)
    }

    fn bring_up(&mut self, idx: usize) -> Result<(), SimError> {
        let (ends, latency) = {
            let link = &mut self.links[idx];
            link.up = true;
            (link.ends.clone(), link.latency)
        };
        tracing::info!(
            a = %ends[0].node,
            b = %ends[1].node,
            latency,
            "link up"
        );

        for (i, end) in ends.iter().enumerate() {
            let peer = &ends[1 - i];
            if let Some(router) = self.routers.get_mut(&end.node) {
                router.on_link_up(end.port, Latency::Finite(latency));
                if self.hosts.contains_key(&peer.node) {
                    router.install_static_route(peer.node.clone(), end.port)?;
                }
            }
            self.flush(&end.node);
        }
        Ok(())
    }

    fn take_down(&mut self, idx: usize) {
        let ends = {
            let link = &mut self.links[idx];
            if !link.up {
                return;
            }
            link.up = false;
            link.epoch += 1;
            link.ends.clone()
        };
        tracing::info!(a = %ends[0].node, b = %ends[1].node, "link down");

        for end in &ends {
            if let Some(router) = self.routers.get_mut(&end.node) {
                router.on_link_down(end.port);
            }
            self.flush(&end.node);
        }
    }

    /// Bring an existing link back up, or create it (latency defaults to 1).
    pub fn link_up(&mut self, a: &str, b: &str, latency: Option<u64>) -> Result<(), SimError> {
        let a_id = self.ensure_known(a)?;
        let b_id = self.ensure_known(b)?;
        match self.find_link(&a_id, &b_id) {
            Some(idx) if self.links[idx].up => Ok(()),
            Some(idx) => {
                if let Some(latency) = latency {
                    self.links[idx].latency = latency;
                }
                self.bring_up(idx)
            }
            None => self.add_link(a, b, latency.unwrap_or(1)),
        }
    }

    pub fn link_down(&mut self, a: &str, b: &str) -> Result<(), SimError> {
        let a_id = self.ensure_known(a)?;
        let b_id = self.ensure_known(b)?;
        let idx = self
            .find_link(&a_id, &b_id)
            .ok_or_else(|| SimError::NoSuchLink {
                a: a.to_string(),
                b: b.to_string(),
            })?;
        self.take_down(idx);
        Ok(())
    }

    /// Send a data packet from host `from` to node `to` right now.
    pub fn ping(&mut self, from: &str, to: &str) -> Result<(), SimError> {
        let src = self.ensure_known(from)?;
        let dst = self.ensure_known(to)?;
        let uplink = match self.hosts.get(&src) {
            Some(uplink) => *uplink,
            None => return Err(SimError::NotAHost(from.to_string())),
        };

        let mut packet = DataPacket::new(src.clone(), dst, Bytes::from_static(b"ping"));
        packet.trace.push(src.clone());
        tracing::info!(src = %packet.src, dst = %packet.dst, "ping");

        let port = uplink
            .and_then(|idx| self.links[idx].end_of(&src))
            .map(|end| end.port);
        match port {
            Some(port) => self.transmit(&src, port, Message::Packet(packet)),
            None => self.record_loss(&src, &packet, LossReason::LinkDown),
        }
        Ok(())
    }

    /// Queue a scripted event. Node names are checked now, not when the
    /// event fires.
    pub fn schedule(&mut self, event: ScriptedEvent) -> Result<(), SimError> {
        match &event.action {
            Action::LinkUp { a, b, .. } | Action::LinkDown { a, b } => {
                self.ensure_known(a)?;
                self.ensure_known(b)?;
            }
            Action::Ping { from, to } => {
                self.ensure_known(from)?;
                self.ensure_known(to)?;
            }
        }
        self.push(sim_time(event.at), SimEvent::Script(event.action));
        Ok(())
    }

    fn record_loss(&mut self, node: &NodeId, packet: &DataPacket, reason: LossReason) {
        tracing::debug!(
            %node,
            src = %packet.src,
            dst = %packet.dst,
            %reason,
            "packet lost"
        );
        self.lost.push(LostPacket {
            at: self.now(),
            src: packet.src.clone(),
            dst: packet.dst.clone(),
            node: node.clone(),
            reason,
        });
    }

    fn discard(&mut self, node: &NodeId, message: Message) {
        match message {
            Message::Packet(packet) => self.record_loss(node, &packet, LossReason::LinkDown),
            Message::Advertisement(advert) => {
                tracing::trace!(
                    %node,
                    destination = %advert.destination,
                    "advertisement lost on dead link"
                );
            }
        }
    }

    /// Put a message on the wire from `node`'s `port`.
    fn transmit(&mut self, node: &NodeId, port: PortId, message: Message) {
        let endpoint = Endpoint {
            node: node.clone(),
            port,
        };
        let Some(&idx) = self.port_index.get(&endpoint) else {
            self.discard(node, message);
            return;
        };
        let link = &self.links[idx];
        if !link.up {
            self.discard(node, message);
            return;
        }
        let at = self.clock.now() + sim_duration(link.latency);
        let event = SimEvent::Deliver {
            link: idx,
            epoch: link.epoch,
            to: link.peer_of(node).clone(),
            message,
        };
        self.push(at, event);
    }

    /// Hand everything a router queued to the links.
    fn flush(&mut self, node: &NodeId) {
        let outgoing = match self.routers.get_mut(node) {
            Some(router) => router.link_layer_mut().drain(),
            None => return,
        };
        for msg in outgoing {
            match msg {
                Outbound::Advertisement { port, advert } => {
                    self.transmit(node, port, Message::Advertisement(advert))
                }
                Outbound::Packet { port, packet } => {
                    self.transmit(node, port, Message::Packet(packet))
                }
            }
        }
    }

    fn deliver(&mut self, link: usize, epoch: u64, to: Endpoint, message: Message) {
        let live = self
            .links
            .get(link)
            .is_some_and(|l| l.up && l.epoch == epoch);
        if !live {
            self.discard(&to.node, message);
            return;
        }

        match message {
            Message::Advertisement(advert) => {
                // Hosts do not take part in routing.
                if let Some(router) = self.routers.get_mut(&to.node) {
                    router.on_advertisement(advert, to.port);
                    self.flush(&to.node);
                }
            }
            Message::Packet(mut packet) => {
                packet.trace.push(to.node.clone());
                if self.hosts.contains_key(&to.node) {
                    if packet.dst == to.node {
                        tracing::info!(
                            src = %packet.src,
                            dst = %packet.dst,
                            hops = packet.hop_count(),
                            "packet delivered"
                        );
                        self.delivered.push(Delivery {
                            at: self.now(),
                            src: packet.src,
                            dst: packet.dst,
                            path: packet.trace,
                        });
                    } else {
                        self.record_loss(&to.node, &packet, LossReason::Misdelivered);
                    }
                } else if packet.hop_count() > self.settings.max_packet_hops {
                    self.record_loss(&to.node, &packet, LossReason::HopLimit);
                } else if let Some(router) = self.routers.get_mut(&to.node) {
                    let dropped_before = router.stats().packets_dropped;
                    router.on_data_packet(packet.clone(), to.port);
                    if router.stats().packets_dropped > dropped_before {
                        self.record_loss(&to.node, &packet, LossReason::NoRoute);
                    }
                    self.flush(&to.node);
                }
            }
        }
    }

    fn tick(&mut self) {
        let ids: Vec<NodeId> = self.routers.keys().cloned().collect();
        for id in &ids {
            if let Some(router) = self.routers.get_mut(id) {
                router.on_periodic_tick();
            }
            self.flush(id);
        }
        let next = self.clock.now() + sim_duration(self.settings.tick_interval);
        self.push(next, SimEvent::Tick);
    }

    fn handle(&mut self, event: SimEvent) -> Result<(), SimError> {
        match event {
            SimEvent::Tick => self.tick(),
            SimEvent::Deliver {
                link,
                epoch,
                to,
                message,
            } => self.deliver(link, epoch, to, message),
            SimEvent::Script(action) => match action {
                Action::LinkUp { a, b, latency } => self.link_up(&a, &b, latency)?,
                Action::LinkDown { a, b } => self.link_down(&a, &b)?,
                Action::Ping { from, to } => self.ping(&from, &to)?,
            },
        }
        Ok(())
    }

    /// Process every event up to and including simulated second `secs`,
    /// then leave the clock at `secs`.
    pub fn run_until(&mut self, secs: u64) -> Result<(), SimError> {
        let end = sim_time(secs);
        while self.queue.peek().is_some_and(|s| s.at <= end) {
            let Some(next) = self.queue.pop() else {
                break;
            };
            if next.at > self.clock.now() {
                self.clock.set(next.at);
            }
            self.handle(next.event)?;
        }
        if end > self.clock.now() {
            self.clock.set(end);
        }
        Ok(())
    }

    /// Run for the configured duration and report.
    pub fn run(&mut self) -> Result<SimReport, SimError> {
        self.run_until(self.settings.duration)?;
        Ok(self.report())
    }

    /// Snapshot of deliveries, losses, and every router's table and counters.
    pub fn report(&self) -> SimReport {
        let routers = self
            .routers
            .values()
            .map(|r| {
                (
                    r.id().clone(),
                    RouterReport {
                        table: r.table().clone(),
                        stats: r.stats(),
                    },
                )
            })
            .collect();
        SimReport {
            ended_at: self.now(),
            delivered: self.delivered.clone(),
            lost: self.lost.clone(),
            routers,
        }
    }
}
