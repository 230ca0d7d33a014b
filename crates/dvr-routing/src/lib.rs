//! DVR Routing: Distance-vector routing engine.
//!
//! This crate provides:
//! - [`RoutingTable`]: the best known route per destination.
//! - [`PortRegistry`]: the links that are currently up and their latencies.
//! - [`AdvertisementHistory`]: what was last advertised on each port.
//! - [`RouteAdvertisement`] and [`build_round`]: advertisement shaping with
//!   split horizon / poison reverse and redundant-send suppression.
//! - [`DvRouter`]: the event-driven engine implementing [`RoutingNode`].
//! - [`Clock`] and [`LinkLayer`]: the collaborators a host injects.

pub mod advertisement;
pub mod clock;
pub mod engine;
pub mod error;
pub mod history;
pub mod link;
pub mod ports;
pub mod table;

// Re-exports for convenience.
pub use advertisement::{build_round, shape, AdvertisementRound, RouteAdvertisement};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{DvRouter, RouterStats, RoutingNode};
pub use error::RoutingError;
pub use history::AdvertisementHistory;
pub use link::{LinkLayer, Outbound, Outbox};
pub use ports::PortRegistry;
pub use table::{RouteEntry, RoutingTable};
