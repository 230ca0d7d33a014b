pub mod config;
pub mod error;
pub mod network;
pub mod report;

pub use config::{Action, LinkSpec, LoggingConfig, ScriptedEvent, SimConfig, SimSettings};
pub use error::SimError;
pub use network::{Network, SimRouter};
pub use report::{Delivery, LossReason, LostPacket, RouterReport, SimReport};
