//! Integration test: optional reactions to link state changes and route
//! expiry.

use dvr_core::{Latency, LoopSuppression, NodeId, RouterConfig};
use dvr_integration_tests::{build, expiry_at, latency, line, settings};
use dvr_sim::{LossReason, Network};

/// `h1 - r1 - r2 - h2` with periodic ticks disabled.
fn silent_line(config: RouterConfig) -> Network {
    build(
        config,
        settings(0),
        &["r1", "r2"],
        &["h1", "h2"],
        &[("h1", "r1", 1), ("r1", "r2", 1), ("r2", "h2", 1)],
    )
    .unwrap()
}

#[test]
fn test_send_on_link_up_shares_table() {
    let config = RouterConfig {
        send_on_link_up: true,
        ..Default::default()
    };
    let mut net = silent_line(config);
    net.run_until(10).unwrap();

    // r1 already knew h1 when the r1 - r2 link came up.
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Finite(2)));
    // r2's h2 rides along on the triggered update for h1.
    assert_eq!(latency(&net, "r1", "h2"), Some(Latency::Finite(2)));
}

#[test]
fn test_no_ticks_no_routes() {
    let mut net = silent_line(RouterConfig::default());
    net.run_until(60).unwrap();
    assert_eq!(latency(&net, "r2", "h1"), None);
    assert_eq!(latency(&net, "r1", "h2"), None);
    assert_eq!(net.router("r1").unwrap().stats().adverts_sent, 0);
}

#[test]
fn test_poison_on_link_down() {
    let config = RouterConfig {
        poison_on_link_down: true,
        ..Default::default()
    };
    let mut net = line(config).unwrap();
    net.run_until(10).unwrap();
    net.link_down("r1", "r2").unwrap();

    assert_eq!(latency(&net, "r1", "h2"), Some(Latency::Infinity));
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Infinity));

    // Poisoned at 10, gone at the tick at 25.
    net.run_until(20).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), Some(Latency::Infinity));
    net.run_until(30).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), None);
}

fn orphan_h2(poison_expired: bool) -> Network {
    let config = RouterConfig {
        loop_suppression: LoopSuppression::SplitHorizon,
        poison_expired,
        ..Default::default()
    };
    let mut net = line(config).unwrap();
    // r2's tick at 20 refreshes r1's route at 21.
    net.run_until(20).unwrap();
    net.link_down("r2", "h2").unwrap();
    assert_eq!(latency(&net, "r2", "h2"), None);
    net
}

#[test]
fn test_stale_route_expires() {
    let mut net = orphan_h2(false);
    net.run_until(30).unwrap();
    net.ping("h1", "h2").unwrap();

    net.run_until(35).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), Some(Latency::Finite(2)));
    // r1 still forwards on its stale route; r2 has nowhere to send it.
    assert_eq!(net.lost().len(), 1);
    assert_eq!(net.lost()[0].node, NodeId::from("r2"));
    assert_eq!(net.lost()[0].reason, LossReason::NoRoute);

    net.run_until(40).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), None);
    assert_eq!(net.router("r1").unwrap().stats().routes_expired, 1);
}

#[test]
fn test_poison_expired_keeps_unreachable_route() {
    let mut net = orphan_h2(true);

    net.run_until(45).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), Some(Latency::Infinity));

    // Poisoned at 40, poisoned again when that expires at 55.
    net.run_until(55).unwrap();
    let entry = net.route("r1", "h2").unwrap();
    assert_eq!(entry.latency, Latency::Infinity);
    assert_eq!(entry.expiry, expiry_at(70));
    assert_eq!(net.router("r1").unwrap().stats().routes_expired, 2);

    net.run_until(70).unwrap();
    assert_eq!(net.route("r1", "h2").unwrap().expiry, expiry_at(85));
    assert_eq!(net.router("r1").unwrap().stats().routes_expired, 3);
}

#[test]
fn test_link_down_poison_outlives_its_ttl() {
    let config = RouterConfig {
        poison_on_link_down: true,
        poison_expired: true,
        ..Default::default()
    };
    let mut net = line(config).unwrap();
    net.run_until(10).unwrap();
    net.link_down("r1", "r2").unwrap();
    assert_eq!(net.route("r1", "h2").unwrap().expiry, expiry_at(25));

    // The tick at 25 finds it expired and poisons it for another TTL.
    net.run_until(30).unwrap();
    let entry = net.route("r1", "h2").unwrap();
    assert_eq!(entry.latency, Latency::Infinity);
    assert_eq!(entry.expiry, expiry_at(40));
    assert_eq!(net.router("r1").unwrap().stats().routes_expired, 1);

    net.ping("h1", "h2").unwrap();
    net.run_until(35).unwrap();
    assert!(net.delivered().is_empty());
    assert_eq!(net.lost()[0].node, NodeId::from("r1"));
    assert_eq!(net.lost()[0].reason, LossReason::NoRoute);
}
