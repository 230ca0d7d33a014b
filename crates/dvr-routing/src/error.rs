use dvr_core::{CoreError, PortId};

/// Errors that can occur within the routing layer.
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("link on port {port} is down")]
    LinkDown { port: PortId },

    #[error("configuration error: {0}")]
    Config(#[from] CoreError),
}
