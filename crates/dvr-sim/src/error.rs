//! Simulator error types.

use dvr_routing::RoutingError;

/// Errors raised while building or running a simulated network.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A name that does not belong to any router or host.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// Two nodes registered under the same name.
    #[error("duplicate node name: {0}")]
    DuplicateNode(String),

    /// A node was expected to be a host.
    #[error("node {0} is not a host")]
    NotAHost(String),

    /// Hosts only talk to routers.
    #[error("link between two hosts: {a} - {b}")]
    HostToHostLink { a: String, b: String },

    /// A node linked to itself.
    #[error("node {0} cannot link to itself")]
    SelfLink(String),

    /// Hosts have exactly one uplink.
    #[error("host {0} already has a link")]
    HostAlreadyLinked(String),

    /// The pair is already connected.
    #[error("link {a} - {b} already exists")]
    DuplicateLink { a: String, b: String },

    /// The pair is not connected.
    #[error("no link between {a} and {b}")]
    NoSuchLink { a: String, b: String },

    /// Error from the routing engine.
    #[error("routing error: {0}")]
    Routing(#[from] RoutingError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be written.
    #[error("config encode error: {0}")]
    ConfigEncode(#[from] toml::ser::Error),
}
