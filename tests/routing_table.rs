//! Routing table behavior tests.

mod common;

use common::{AvailabilityFlag, RecordingSink};
use route_registry::availability::AvailabilityAggregator;
use route_registry::table::{Endpoint, RouteDetails, RouteEvent, RouteRegistrar, RoutingTable};
use route_registry::Shutdown;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const HOST: &str = "foo.example.com";
const APPLICATION_INDEX: u32 = 2;
const PRIVATE_INSTANCE_ID: &str = "private-instance-1";

fn endpoint() -> Endpoint {
    Endpoint::new("1.2.3.4", 1234)
}

fn table_with_timeout(
    stale_route_timeout: Duration,
    availability: AvailabilityAggregator,
) -> (Arc<RecordingSink>, RoutingTable) {
    let sink = RecordingSink::new();
    let table = RoutingTable::new(sink.clone(), stale_route_timeout, availability);
    (sink, table)
}

fn table() -> (Arc<RecordingSink>, RoutingTable) {
    table_with_timeout(Duration::from_secs(60), AvailabilityAggregator::new())
}

fn register_default_route(table: &RoutingTable, application_id: Uuid) {
    table.register_route(
        HOST,
        endpoint(),
        Some(application_id),
        Some(APPLICATION_INDEX),
        Some(PRIVATE_INSTANCE_ID),
    );
}

fn assert_default_route(route: &RouteDetails, application_id: Uuid) {
    assert_eq!(route.endpoint, endpoint());
    assert_eq!(route.application_id, Some(application_id));
    assert_eq!(route.application_index, Some(APPLICATION_INDEX));
    assert_eq!(route.host, HOST);
    assert_eq!(route.private_instance_id.as_deref(), Some(PRIVATE_INSTANCE_ID));
}

#[test]
fn table_holds_registered_routes() {
    let (_sink, table) = table();
    let app = Uuid::new_v4();
    register_default_route(&table, app);

    let routes = table.routes(HOST);
    assert_eq!(routes.len(), 1);
    assert_default_route(&routes[0], app);

    // An unresolved hostname is a valid second endpoint.
    let second = Endpoint::new("backend.internal", 54321);
    table.register_route(HOST, second.clone(), None, None, None);
    let routes = table.routes(HOST);
    assert_eq!(routes.len(), 2);
    assert!(routes.iter().any(|r| r.endpoint == second));
}

#[test]
fn inserted_routes_do_not_emit_events() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    table.insert_route(
        HOST,
        endpoint(),
        Some(app),
        Some(APPLICATION_INDEX),
        Some(PRIVATE_INSTANCE_ID),
    );

    let routes = table.routes(HOST);
    assert_eq!(routes.len(), 1);
    assert_default_route(&routes[0], app);
    assert!(sink.poll().is_none());
}

#[test]
fn register_emits_event_for_new_route() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    register_default_route(&table, app);

    match sink.poll() {
        Some(RouteEvent::Registered(route)) => assert_default_route(&route, app),
        other => panic!("expected register event, got {:?}", other),
    }
}

#[test]
fn reregistering_identical_route_emits_nothing() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    register_default_route(&table, app);
    let first_update = table.routes(HOST)[0].last_updated;

    std::thread::sleep(Duration::from_millis(5));
    register_default_route(&table, app);

    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));
    assert!(sink.poll().is_none(), "second registration must be silent");

    // The silent re-registration still refreshes freshness.
    assert!(table.routes(HOST)[0].last_updated > first_update);
}

#[test]
fn private_instance_change_emits_event() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    register_default_route(&table, app);
    table.register_route(HOST, endpoint(), Some(app), Some(APPLICATION_INDEX), None);

    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));
    match sink.poll() {
        Some(RouteEvent::Registered(route)) => assert!(route.private_instance_id.is_none()),
        other => panic!("expected second register event, got {:?}", other),
    }
}

#[test]
fn application_id_change_emits_event() {
    let (sink, table) = table();
    register_default_route(&table, Uuid::new_v4());
    let new_app = Uuid::new_v4();
    table.register_route(
        HOST,
        endpoint(),
        Some(new_app),
        Some(APPLICATION_INDEX),
        Some(PRIVATE_INSTANCE_ID),
    );

    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));
    match sink.poll() {
        Some(RouteEvent::Registered(route)) => assert_eq!(route.application_id, Some(new_app)),
        other => panic!("expected second register event, got {:?}", other),
    }
}

#[test]
fn index_only_change_emits_no_event() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    register_default_route(&table, app);
    table.register_route(
        HOST,
        endpoint(),
        Some(app),
        Some(APPLICATION_INDEX + 5),
        Some(PRIVATE_INSTANCE_ID),
    );

    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));
    assert!(
        sink.poll().is_none(),
        "an index-only change is not a new registration"
    );
}

#[test]
fn unregister_emits_event_with_last_flag() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    register_default_route(&table, app);
    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));

    assert!(table.unregister_route(HOST, &endpoint()));
    match sink.poll() {
        Some(RouteEvent::Unregistered { route, last }) => {
            assert_default_route(&route, app);
            assert!(last);
        }
        other => panic!("expected unregister event, got {:?}", other),
    }

    // Unregistering an absent route is not an error and emits nothing.
    assert!(!table.unregister_route(HOST, &endpoint()));
    assert!(sink.poll().is_none());
}

#[test]
fn last_flag_set_only_on_final_endpoint() {
    let (sink, table) = table();
    let host = "bar.example.com";
    let first = Endpoint::new("1.0.0.0", 1);
    let second = Endpoint::new("1.0.0.0", 2);

    table.insert_route(host, first.clone(), None, None, None);
    table.insert_route(host, second.clone(), None, None, None);

    table.unregister_route(host, &first);
    table.unregister_route(host, &second);

    match sink.poll() {
        Some(RouteEvent::Unregistered { last, .. }) => assert!(!last),
        other => panic!("expected unregister event, got {:?}", other),
    }
    match sink.poll() {
        Some(RouteEvent::Unregistered { last, .. }) => assert!(last),
        other => panic!("expected unregister event, got {:?}", other),
    }
}

#[test]
fn forces_lowercase_hosts() {
    let (sink, table) = table();
    let endpoint = Endpoint::new("1.0.0.0", 1);
    table.register_route("TEST", endpoint.clone(), None, None, None);

    let routes = table.routes("TeSt");
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].host, "test");

    assert!(table.unregister_route("tESt", &endpoint));
    match sink.poll() {
        Some(RouteEvent::Registered(route)) => assert_eq!(route.host, "test"),
        other => panic!("expected register event, got {:?}", other),
    }
    match sink.poll() {
        Some(RouteEvent::Unregistered { route, .. }) => assert_eq!(route.host, "test"),
        other => panic!("expected unregister event, got {:?}", other),
    }
}

#[test]
fn route_lookup_by_endpoint() {
    let (_sink, table) = table();
    let host = "bar.example.com";
    let first = Endpoint::new("1.0.0.0", 1);
    let second = Endpoint::new("1.0.0.1", 2);
    let other_host = "one.two.example.com";
    let third = Endpoint::new("1.0.0.2", 80);

    table.insert_route(host, first.clone(), None, None, None);
    table.insert_route(host, second.clone(), None, None, None);
    table.insert_route(other_host, third.clone(), None, None, None);

    assert_eq!(table.route_by_endpoint(&first).map(|r| r.host), Some(host.to_string()));
    assert_eq!(table.route_by_endpoint(&second).map(|r| r.host), Some(host.to_string()));
    assert_eq!(
        table.route_by_endpoint(&third).map(|r| r.host),
        Some(other_host.to_string())
    );

    table.unregister_route(host, &first);
    assert!(table.route_by_endpoint(&first).is_none());
    assert!(table.route_by_endpoint(&second).is_some());
}

#[test]
fn stale_routes_evicted_after_timeout() {
    let stale_route_timeout = Duration::from_millis(100);
    let (sink, table) = table_with_timeout(stale_route_timeout, AvailabilityAggregator::new());
    let app = Uuid::new_v4();
    register_default_route(&table, app);

    // Fresh routes survive a sweep.
    assert_eq!(table.cleanup_stale_routes(), 0);
    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));

    std::thread::sleep(stale_route_timeout + Duration::from_millis(20));
    assert_eq!(table.cleanup_stale_routes(), 1);

    assert!(table.routes(HOST).is_empty());
    assert!(table.route_by_endpoint(&endpoint()).is_none());
    match sink.poll() {
        Some(RouteEvent::Unregistered { route, last }) => {
            assert_default_route(&route, app);
            assert!(last);
        }
        other => panic!("expected unregister event, got {:?}", other),
    }
}

#[test]
fn sweep_skipped_while_route_source_unavailable() {
    let flag = AvailabilityFlag::new(false);
    let availability = AvailabilityAggregator::new();
    availability.add_provider(flag.clone());

    let stale_route_timeout = Duration::from_millis(10);
    let (sink, table) = table_with_timeout(stale_route_timeout, availability);
    register_default_route(&table, Uuid::new_v4());
    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));

    std::thread::sleep(stale_route_timeout + Duration::from_millis(20));
    assert!(table.cleanup_stale_routes() < 0);
    assert_eq!(table.routes(HOST).len(), 1);
    assert!(sink.poll().is_none());

    // Once the route source recovers, the next sweep evicts.
    flag.set(true);
    assert_eq!(table.cleanup_stale_routes(), 1);
    assert!(table.routes(HOST).is_empty());
    assert!(matches!(sink.poll(), Some(RouteEvent::Unregistered { .. })));
}

#[test]
fn register_query_unregister_round_trip() {
    let (sink, table) = table();
    let app = Uuid::new_v4();
    let endpoint = Endpoint::new("10.0.0.1", 6000);
    table.register_route("foo.example.com", endpoint.clone(), Some(app), Some(0), Some("i1"));

    let routes = table.routes("foo.example.com");
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].endpoint, endpoint);
    assert_eq!(routes[0].application_id, Some(app));
    assert_eq!(routes[0].application_index, Some(0));
    assert_eq!(routes[0].private_instance_id.as_deref(), Some("i1"));

    assert!(table.unregister_route("foo.example.com", &endpoint));
    assert!(table.routes("foo.example.com").is_empty());

    assert!(matches!(sink.poll(), Some(RouteEvent::Registered(_))));
    match sink.poll() {
        Some(RouteEvent::Unregistered { last, .. }) => assert!(last),
        other => panic!("expected unregister event, got {:?}", other),
    }
}

#[tokio::test]
async fn evictor_task_sweeps_periodically() {
    let stale_route_timeout = Duration::from_millis(50);
    let (sink, table) = table_with_timeout(stale_route_timeout, AvailabilityAggregator::new());
    let table = Arc::new(table);
    let shutdown = Shutdown::new();

    table.insert_route(HOST, endpoint(), None, None, None);
    table.clone().start(Duration::from_millis(50), &shutdown);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(table.routes(HOST).is_empty());
    assert!(matches!(
        sink.poll(),
        Some(RouteEvent::Unregistered { last: true, .. })
    ));

    table.close();
    // Closing twice is fine, as is closing a table whose sweep never ran.
    table.close();
}
