//! End-to-end feed and trip scenarios through the public API.
//!
//! Run with: `cargo test --test feed_scenarios`

use lifting_lads::{
    accept, estimate_impact, estimate_trip, great_circle_distance_km, partition_and_order,
    reject, render_label, ActivityEvent, ActivityFeed, ActivityKind, EcoConfig, FeedConfig,
    GeoPoint, Gym, LabelStyle,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sarah_and_stan() -> Vec<ActivityEvent> {
    vec![
        ActivityEvent::request(1, "Sarah", 1),
        ActivityEvent::accept(2, "Stan", 2),
    ]
}

// ============================================================================
// Scenario: accept a pending request
// ============================================================================

#[test]
fn test_sarah_request_accepted() {
    init_logging();
    let feed = sarah_and_stan();

    let ordered = partition_and_order(&feed);
    assert_eq!(ordered[0].actor, "Sarah");
    assert_eq!(ordered[0].kind(), ActivityKind::Request);
    assert_eq!(ordered[1].actor, "Stan");

    let feed = accept(&feed, 1);
    assert_eq!(feed.len(), 2);
    assert!(feed.iter().all(|e| e.id != 1));

    let sarah = feed.iter().find(|e| e.actor == "Sarah").unwrap();
    assert_eq!(sarah.id, 3);
    assert_eq!(sarah.kind(), ActivityKind::Accept);
    assert_eq!(sarah.recency_rank, 0);

    // Accepting again is absorbed
    assert_eq!(accept(&feed, 1), feed);

    // Newest accept is shown before the older one
    let labels: Vec<String> = partition_and_order(&feed)
        .iter()
        .map(|e| render_label(e, &LabelStyle::default()))
        .collect();
    assert_eq!(labels, vec!["Sarah became your lad!", "Stan became your lad!"]);
}

#[test]
fn test_reject_sizes() {
    let feed = sarah_and_stan();
    assert_eq!(reject(&feed, 1).len(), 1);
    assert_eq!(reject(&feed, 42).len(), 2);
}

// ============================================================================
// Scenario: stateful feed with remote confirmation
// ============================================================================

#[test]
fn test_feed_deferred_then_optimistic() {
    init_logging();

    let mut deferred = ActivityFeed::new();
    deferred.replace(sarah_and_stan());
    let pending = deferred.begin_accept(1).unwrap();
    assert_eq!(deferred.get(1).map(|e| e.kind()), Some(ActivityKind::Request));
    let new_id = deferred.confirm(pending).unwrap();
    assert_eq!(deferred.get(new_id).unwrap().actor, "Sarah");

    let mut optimistic = ActivityFeed::with_config(FeedConfig {
        optimistic: true,
        ..Default::default()
    });
    optimistic.replace(sarah_and_stan());
    let pending = optimistic.begin_reject(1).unwrap();
    assert_eq!(optimistic.len(), 1);
    optimistic.rollback(pending);
    assert_eq!(optimistic.events(), sarah_and_stan().as_slice());
}

// ============================================================================
// Scenario: trip to the gym
// ============================================================================

#[test]
fn test_trip_to_the_gym() {
    init_logging();
    let home = GeoPoint::new(40.7128, -74.0060);
    let gym = Gym::new("Brooklyn Barbell", GeoPoint::new(40.6782, -73.9442));

    let estimate = estimate_trip(&home, &gym, &EcoConfig::default()).unwrap();
    let direct = estimate_impact(great_circle_distance_km(&home, &gym.location));
    assert_eq!(estimate, direct);
    assert!(estimate.distance_km > 5.0 && estimate.distance_km < 7.0);
    assert!(estimate.emission_text().starts_with("Estimated carbon emission: 0."));

    let round_trip = EcoConfig {
        round_trip: true,
        ..Default::default()
    };
    let both_ways = estimate_trip(&home, &gym, &round_trip).unwrap();
    assert!((both_ways.fuel_liters - 2.0 * estimate.fuel_liters).abs() < 1e-9);
}
