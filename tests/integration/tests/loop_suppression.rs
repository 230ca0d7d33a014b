//! Integration test: behavior of the loop-suppression modes when a host
//! becomes unreachable.
//!
//! Every scenario uses `h1 - r1 - r2 - h2` and cuts `h1 - r1` at 12, after
//! the routes have converged.

use dvr_core::{Latency, LoopSuppression, NodeId, RouterConfig};
use dvr_integration_tests::{latency, line};
use dvr_sim::{LossReason, Network};

fn cut_host_link(suppression: LoopSuppression) -> Network {
    let config = RouterConfig {
        loop_suppression: suppression,
        ..Default::default()
    };
    let mut net = line(config).unwrap();
    net.run_until(12).unwrap();
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Finite(2)));
    net.link_down("h1", "r1").unwrap();
    assert_eq!(latency(&net, "r1", "h1"), None);
    net
}

#[test]
fn test_without_suppression_counts_to_infinity() {
    let mut net = cut_host_link(LoopSuppression::None);

    // r1 relearns h1 from r2 and the two bounce it back and forth.
    net.run_until(18).unwrap();
    let r1 = latency(&net, "r1", "h1").unwrap();
    let r2 = latency(&net, "r2", "h1").unwrap();
    assert!(r1.is_finite());
    assert!(r2.is_finite());
    assert!(r2 > Latency::Finite(2));

    net.run_until(60).unwrap();
    assert_eq!(latency(&net, "r1", "h1"), Some(Latency::Infinity));
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Infinity));
}

#[test]
fn test_split_horizon_lets_stale_route_expire() {
    let mut net = cut_host_link(LoopSuppression::SplitHorizon);

    net.run_until(18).unwrap();
    assert_eq!(latency(&net, "r1", "h1"), None);
    // Last refreshed at 11, so it lives until 26.
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Finite(2)));

    net.run_until(35).unwrap();
    assert_eq!(latency(&net, "r2", "h1"), None);
    assert_eq!(latency(&net, "r1", "h1"), None);
}

#[test]
fn test_poison_reverse_converges_quickly() {
    let mut net = cut_host_link(LoopSuppression::PoisonReverse);

    net.run_until(18).unwrap();
    assert_eq!(latency(&net, "r2", "h1"), Some(Latency::Infinity));

    net.run_until(20).unwrap();
    net.ping("h2", "h1").unwrap();
    net.run_until(25).unwrap();

    assert!(net.delivered().is_empty());
    assert_eq!(net.lost().len(), 1);
    assert_eq!(net.lost()[0].node, NodeId::from("r2"));
    assert_eq!(net.lost()[0].reason, LossReason::NoRoute);
}
