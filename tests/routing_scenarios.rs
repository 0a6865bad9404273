//! End-to-end routing scenarios across all four policies.

use load_router::config::parse_config;
use load_router::{Policy, Router, ServerId};

mod common;

#[test]
fn test_least_loaded_distributes_evenly() {
    let mut router = common::seeded_router(&common::uniform_pool(3, 5), 1);

    for _ in 0..6 {
        let assignment = router.route(Policy::LeastLoaded, None).unwrap();
        assert!(assignment.is_accepted());
    }

    assert_eq!(common::loads(&router), vec![2, 2, 2]);
}

#[test]
fn test_round_robin_cursor_skips_removed_server() {
    let mut router = common::seeded_router(&common::uniform_pool(3, 10), 1);
    assert_eq!(router.route(Policy::RoundRobin, None).unwrap().server, ServerId(1));

    router.scale_down(&[ServerId(2)]);

    let picked: Vec<u32> = (0..3)
        .map(|_| router.route(Policy::RoundRobin, None).unwrap().server.0)
        .collect();
    assert_eq!(picked, vec![3, 1, 3]);
}

#[test]
fn test_round_robin_visits_in_insertion_order() {
    let mut router = common::seeded_router(&common::uniform_pool(4, 100), 1);
    let picked: Vec<u32> = (0..9)
        .map(|_| router.route(Policy::RoundRobin, None).unwrap().server.0)
        .collect();
    assert_eq!(picked, vec![1, 2, 3, 4, 1, 2, 3, 4, 1]);
}

#[test]
fn test_affinity_binding_outlives_scale_down() {
    let mut router = common::seeded_router(&common::uniform_pool(3, 5), 1);
    let first = router.route(Policy::SessionAffinity, Some("A")).unwrap();
    assert_eq!(first.server, ServerId(1));

    router.scale_down(&[ServerId(1)]);

    // the index keeps the stale binding
    assert_eq!(router.binding("A"), Some(ServerId(1)));

    // routing treats it as a miss and rebinds to the least-loaded survivor
    let second = router.route(Policy::SessionAffinity, Some("A")).unwrap();
    assert_eq!(second.server, ServerId(2));
    assert_eq!(router.binding("A"), Some(ServerId(2)));
}

#[test]
fn test_affinity_sessions_spread_then_stick() {
    let mut router = common::seeded_router(&common::uniform_pool(3, 5), 1);
    let sessions = ["alice", "bob", "carol"];

    let bound: Vec<ServerId> = sessions
        .iter()
        .map(|s| router.route(Policy::SessionAffinity, Some(*s)).unwrap().server)
        .collect();
    assert_eq!(bound, vec![ServerId(1), ServerId(2), ServerId(3)]);

    for (session, server) in sessions.iter().zip(&bound) {
        let again = router.route(Policy::SessionAffinity, Some(*session)).unwrap();
        assert_eq!(again.server, *server);
    }
}

#[test]
fn test_latency_route_prefers_nearest_eligible() {
    // edges from 1: to 2 weight 3, to 3 weight 8
    let specs = common::pool_with(&[(5, 10), (5, 3), (5, 8)]);
    let mut router = common::seeded_router(&specs, 1);

    assert_eq!(router.latency_route(ServerId(1)).unwrap(), ServerId(2));

    router.fail(ServerId(2));
    assert_eq!(router.latency_route(ServerId(1)).unwrap(), ServerId(3));
}

#[test]
fn test_latency_route_skips_saturated_neighbour() {
    let specs = common::pool_with(&[(5, 10), (1, 3), (5, 8)]);
    let mut router = common::seeded_router(&specs, 1);

    // fill server 2 through round-robin (1, then 2)
    router.route(Policy::RoundRobin, None).unwrap();
    router.route(Policy::RoundRobin, None).unwrap();
    assert!(router.server(ServerId(2)).unwrap().is_overloaded());

    assert_eq!(router.latency_route(ServerId(1)).unwrap(), ServerId(3));
}

#[test]
fn test_latency_route_falls_back_to_least_loaded() {
    let specs = common::pool_with(&[(5, 10), (5, 3), (5, 8)]);
    let mut router = common::seeded_router(&specs, 1);
    router.fail(ServerId(2));
    router.fail(ServerId(3));

    let entries = router.priority_entries();
    // no eligible neighbour of 1: the priority index answers instead
    assert_eq!(router.latency_route(ServerId(1)).unwrap(), ServerId(1));
    // the fallback entry is put back
    assert_eq!(router.priority_entries(), entries);
}

#[test]
fn test_latency_aware_route_avoids_failed_neighbours() {
    let specs = common::pool_with(&[(50, 10), (50, 3), (50, 8), (50, 12)]);
    let mut router = common::seeded_router(&specs, 99);
    router.fail(ServerId(2));

    for _ in 0..40 {
        let assignment = router.route(Policy::LatencyAware, None).unwrap();
        assert!(assignment.is_accepted());
    }
    // every start has an eligible neighbour, so the failed server never
    // comes back from the topology
    assert_eq!(router.server(ServerId(2)).unwrap().load(), 0);
}

#[test]
fn test_scaled_up_server_joins_topology() {
    let specs = common::pool_with(&[(5, 10), (5, 9)]);
    let mut router = common::seeded_router(&specs, 1);
    router
        .scale_up(&[load_router::ServerSpec::new(ServerId(3), 5, 1)])
        .unwrap();

    assert_eq!(router.latency_route(ServerId(1)).unwrap(), ServerId(3));
}

#[test]
fn test_router_from_config_file_contents() {
    let config = parse_config(
        r#"
        [pool]
        servers = [
            { id = 7, capacity = 2, latency = 4 },
            { id = 9, capacity = 2, latency = 6 },
        ]

        [routing]
        default_policy = "round_robin"
        seed = 5
        "#,
    )
    .unwrap();
    let mut router = Router::from_config(&config).unwrap();

    assert_eq!(router.default_policy(), Policy::RoundRobin);
    assert_eq!(router.route_default(None).unwrap().server, ServerId(7));
    assert_eq!(router.route_default(None).unwrap().server, ServerId(9));
    assert_eq!(router.next_server_id(), Ok(ServerId(10)));
}
