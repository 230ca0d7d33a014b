//! Integration test: two routers wired by hand through their outboxes,
//! without the simulator.

use dvr_core::{Latency, LoopSuppression, NodeId, PortId, RouterConfig};
use dvr_routing::{DvRouter, ManualClock, Outbox, RouteAdvertisement, RoutingNode};

type Router = DvRouter<ManualClock, Outbox>;

/// `H - r1 =(3)= r2`: r1 has H attached on port 1 and r2 on port 2.
/// Returns r2 after it has heard r1's table, with r2's reply still queued.
fn pair(suppression: LoopSuppression) -> Router {
    let clock = ManualClock::at_epoch();
    let config = RouterConfig {
        loop_suppression: suppression,
        ..Default::default()
    };
    let mut r1 = DvRouter::new("r1".into(), config.clone(), clock.clone(), Outbox::new()).unwrap();
    let mut r2 = DvRouter::new("r2".into(), config, clock, Outbox::new()).unwrap();

    r1.on_link_up(PortId(1), Latency::Finite(1));
    r1.install_static_route("H".into(), PortId(1)).unwrap();
    r1.on_link_up(PortId(2), Latency::Finite(3));
    r2.on_link_up(PortId(1), Latency::Finite(3));

    r1.send_routes(true, None);
    for (port, advert) in r1.link_layer_mut().take_advertisements() {
        if port == PortId(2) {
            r2.on_advertisement(advert, PortId(1));
        }
    }

    let entry = r2.table().get(&NodeId::from("H")).unwrap();
    assert_eq!(entry.latency, Latency::Finite(4));
    assert_eq!(entry.next_hop, PortId(1));
    r2
}

#[test]
fn test_reply_without_suppression() {
    let mut r2 = pair(LoopSuppression::None);
    let replies = r2.link_layer_mut().take_advertisements();
    assert_eq!(
        replies,
        vec![(PortId(1), RouteAdvertisement::new("H".into(), Latency::Finite(4)))]
    );
}

#[test]
fn test_reply_with_split_horizon() {
    let mut r2 = pair(LoopSuppression::SplitHorizon);
    assert!(r2.link_layer_mut().take_advertisements().is_empty());
    assert_eq!(r2.stats().adverts_sent, 0);
}

#[test]
fn test_reply_with_poison_reverse() {
    let mut r2 = pair(LoopSuppression::PoisonReverse);
    let replies = r2.link_layer_mut().take_advertisements();
    assert_eq!(replies, vec![(PortId(1), RouteAdvertisement::poison("H".into()))]);
}
