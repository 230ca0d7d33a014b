//! Integration test: routes converge, packets follow them, and the network
//! recovers from link failures.

use dvr_core::{Latency, PortId, RouterConfig};
use dvr_integration_tests::{latency, line, path, triangle};
use dvr_sim::{Network, SimConfig};

// =========================================================================
// Line topology
// =========================================================================

#[test]
fn test_line_converges_and_delivers() {
    let mut net = line(RouterConfig::default()).unwrap();

    // Nothing is advertised before the first tick at 5.
    net.run_until(4).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), None);

    net.run_until(7).unwrap();
    assert_eq!(latency(&net, "r1", "h2"), Some(Latency::Finite(2)));
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Finite(2)));

    net.run_until(10).unwrap();
    net.ping("h1", "h2").unwrap();
    net.ping("h2", "h1").unwrap();
    net.run_until(20).unwrap();

    assert_eq!(net.delivered().len(), 2);
    assert!(net.lost().is_empty());
    assert_eq!(path(&net, 0), vec!["h1", "r1", "r2", "h2"]);
    assert_eq!(path(&net, 1), vec!["h2", "r2", "r1", "h1"]);
    assert_eq!(net.delivered()[0].at, 13);
}

#[test]
fn test_static_routes_survive_ticks() {
    let mut net = line(RouterConfig::default()).unwrap();
    net.run_until(100).unwrap();

    let entry = net.route("r1", "h1").unwrap();
    assert_eq!(entry.latency, Latency::Finite(1));
    assert_eq!(entry.next_hop, PortId(1));
}

// =========================================================================
// Triangle failover
// =========================================================================

#[test]
fn test_triangle_prefers_cheapest_path() {
    let mut net = triangle(RouterConfig::default()).unwrap();
    net.run_until(10).unwrap();

    let entry = net.route("r1", "h2").unwrap();
    assert_eq!(entry.latency, Latency::Finite(2));
    assert_eq!(entry.next_hop, PortId(2));
    assert_eq!(latency(&net, "r3", "h2"), Some(Latency::Finite(3)));
    assert_eq!(latency(&net, "r3", "h1"), Some(Latency::Finite(3)));
}

#[test]
fn test_triangle_fails_over_and_recovers() {
    let mut net = triangle(RouterConfig::default()).unwrap();
    net.run_until(12).unwrap();
    net.link_down("r1", "r2").unwrap();
    assert_eq!(latency(&net, "r1", "h2"), None);

    // r3 advertises its route on the tick at 15; it crosses the r3 link by 17.
    net.run_until(18).unwrap();
    let entry = net.route("r1", "h2").unwrap();
    assert_eq!(entry.latency, Latency::Finite(5));
    assert_eq!(entry.next_hop, PortId(3));
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Finite(5)));

    net.run_until(20).unwrap();
    net.ping("h1", "h2").unwrap();
    net.run_until(30).unwrap();
    assert_eq!(path(&net, 0), vec!["h1", "r1", "r3", "r2", "h2"]);
    assert_eq!(net.delivered()[0].at, 26);

    net.link_up("r1", "r2", None).unwrap();
    net.run_until(37).unwrap();
    let entry = net.route("r1", "h2").unwrap();
    assert_eq!(entry.latency, Latency::Finite(2));
    assert_eq!(entry.next_hop, PortId(2));

    net.run_until(40).unwrap();
    net.ping("h1", "h2").unwrap();
    net.run_until(50).unwrap();
    assert_eq!(path(&net, 1), vec!["h1", "r1", "r2", "h2"]);
    assert!(net.lost().is_empty());
}

// =========================================================================
// Scripted run
// =========================================================================

#[test]
fn test_default_scenario_report() {
    let mut net = Network::from_config(&SimConfig::default()).unwrap();
    let report = net.run().unwrap();

    assert_eq!(report.ended_at, 120);
    assert_eq!(report.delivered.len(), 3);
    assert!(report.lost.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["delivered"][0]["path"][2], "r2");
    assert_eq!(json["delivered"][1]["path"][2], "r3");
    assert_eq!(json["delivered"][2]["path"][2], "r2");
    assert_eq!(json["routers"]["r1"]["table"]["h2"]["latency"], 2);
}
