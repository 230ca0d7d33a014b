//! Topology fixtures shared by the integration scenarios.

use chrono::{DateTime, Duration, Utc};
use dvr_core::{Expiry, Latency, RouterConfig};
use dvr_sim::{Network, SimError, SimSettings};

/// Simulation settings with the given tick interval and defaults otherwise.
pub fn settings(tick_interval: u64) -> SimSettings {
    SimSettings {
        tick_interval,
        ..SimSettings::default()
    }
}

/// Build a network from node names and `(a, b, latency)` links.
pub fn build(
    config: RouterConfig,
    settings: SimSettings,
    routers: &[&str],
    hosts: &[&str],
    links: &[(&str, &str, u64)],
) -> Result<Network, SimError> {
    let mut net = Network::new(config, settings)?;
    for name in routers {
        net.add_router(name)?;
    }
    for name in hosts {
        net.add_host(name)?;
    }
    for (a, b, latency) in links {
        net.add_link(a, b, *latency)?;
    }
    Ok(net)
}

/// `h1 - r1 - r2 - h2`, every link with latency 1, ticking every 5 seconds.
pub fn line(config: RouterConfig) -> Result<Network, SimError> {
    build(
        config,
        settings(5),
        &["r1", "r2"],
        &["h1", "h2"],
        &[("h1", "r1", 1), ("r1", "r2", 1), ("r2", "h2", 1)],
    )
}

/// Two hosts joined by a triangle of routers. The direct `r1 - r2` link is
/// the cheap path; `r1 - r3 - r2` is the detour.
pub fn triangle(config: RouterConfig) -> Result<Network, SimError> {
    build(
        config,
        settings(5),
        &["r1", "r2", "r3"],
        &["h1", "h2"],
        &[
            ("h1", "r1", 1),
            ("r1", "r2", 1),
            ("r2", "h2", 1),
            ("r1", "r3", 2),
            ("r3", "r2", 2),
        ],
    )
}

/// Latency `router` currently believes it has to `destination`.
pub fn latency(net: &Network, router: &str, destination: &str) -> Option<Latency> {
    net.route(router, destination).map(|e| e.latency)
}

/// Names of the nodes a delivered packet visited.
pub fn path(net: &Network, index: usize) -> Vec<String> {
    net.delivered()
        .get(index)
        .map(|d| d.path.iter().map(|n| n.to_string()).collect())
        .unwrap_or_default()
}

/// Expiry at simulated second `secs`.
pub fn expiry_at(secs: i64) -> Expiry {
    Expiry::At(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(secs))
}
