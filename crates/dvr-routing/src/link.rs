use std::collections::VecDeque;

use dvr_core::{DataPacket, PortId};

use crate::advertisement::RouteAdvertisement;

/// The router's view of the link layer: everything it sends goes out
/// through one of these two calls.
pub trait LinkLayer {
    /// Send a route advertisement to the neighbor on `port`.
    fn send_advertisement(&mut self, port: PortId, advert: RouteAdvertisement);

    /// Forward a data packet out of `port`.
    fn forward_packet(&mut self, port: PortId, packet: DataPacket);
}

/// A message handed to the link layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Advertisement {
        port: PortId,
        advert: RouteAdvertisement,
    },
    Packet {
        port: PortId,
        packet: DataPacket,
    },
}

impl Outbound {
    /// The port the message leaves through.
    pub fn port(&self) -> PortId {
        match self {
            Outbound::Advertisement { port, .. } | Outbound::Packet { port, .. } => *port,
        }
    }
}

/// A link layer that buffers outbound messages in send order until the
/// owner drains them.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: VecDeque<Outbound>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every buffered message, oldest first.
    pub fn drain(&mut self) -> Vec<Outbound> {
        self.queue.drain(..).collect()
    }

    /// Take only the buffered advertisements, discarding packets.
    pub fn take_advertisements(&mut self) -> Vec<(PortId, RouteAdvertisement)> {
        self.drain()
            .into_iter()
            .filter_map(|msg| match msg {
                Outbound::Advertisement { port, advert } => Some((port, advert)),
                Outbound::Packet { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl LinkLayer for Outbox {
    fn send_advertisement(&mut self, port: PortId, advert: RouteAdvertisement) {
        self.queue.push_back(Outbound::Advertisement { port, advert });
    }

    fn forward_packet(&mut self, port: PortId, packet: DataPacket) {
        self.queue.push_back(Outbound::Packet { port, packet });
    }
}
