//! DVR Core: Fundamental types, errors, and configuration shared by the
//! distance-vector routing engine and its simulator.

pub mod config;
pub mod error;
pub mod types;

pub use config::{LoopSuppression, RouterConfig};
pub use error::CoreError;
pub use types::{DataPacket, Expiry, Latency, NodeId, PortId};
