//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the feed and eco
//! calculations to Kotlin and Swift. All FFI functions are prefixed with
//! `ffi_` to avoid naming conflicts with the internal API.

use log::{debug, warn};

use crate::activity::{self, ActivityEvent, ActivityKind, LabelStyle};
use crate::eco::{self, EcoConfig, Gym, TripEstimate};
use crate::{init_logging, GeoPoint};

/// Feed event as seen by the mobile side.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActivityEvent {
    pub id: u64,
    pub kind: ActivityKind,
    pub actor: String,
    pub recency_rank: u32,
    pub display_timestamp: String,
    pub note: Option<String>,
    pub friend_type: Option<String>,
    pub picture: Option<String>,
}

impl From<ActivityEvent> for FfiActivityEvent {
    fn from(event: ActivityEvent) -> Self {
        Self {
            id: event.id,
            kind: event.kind(),
            actor: event.actor,
            recency_rank: event.recency_rank,
            display_timestamp: event.display_timestamp,
            note: event.note,
            friend_type: event.friend_type,
            picture: event.picture,
        }
    }
}

impl From<FfiActivityEvent> for ActivityEvent {
    fn from(event: FfiActivityEvent) -> Self {
        let mut converted = match event.kind {
            ActivityKind::Request => ActivityEvent::request(event.id, event.actor, event.recency_rank),
            ActivityKind::Accept => ActivityEvent::accept(event.id, event.actor, event.recency_rank),
            ActivityKind::PersonalRecord => ActivityEvent::personal_record(
                event.id,
                event.actor,
                event.recency_rank,
                event.note,
            ),
        }
        .with_timestamp(event.display_timestamp);
        converted.friend_type = event.friend_type;
        converted.picture = event.picture;
        converted
    }
}

fn to_events(events: Vec<FfiActivityEvent>) -> Vec<ActivityEvent> {
    events.into_iter().map(ActivityEvent::from).collect()
}

fn to_ffi(events: Vec<ActivityEvent>) -> Vec<FfiActivityEvent> {
    events.into_iter().map(FfiActivityEvent::from).collect()
}

// ============================================================================
// Activity Feed
// ============================================================================

/// Order a feed for display (requests first, then by recency).
#[uniffi::export]
pub fn ffi_partition_and_order(events: Vec<FfiActivityEvent>) -> Vec<FfiActivityEvent> {
    init_logging();
    debug!("[LiftingLadsRust] ordering {} events", events.len());
    to_ffi(activity::partition_and_order(&to_events(events)))
}

/// Accept a request. Unknown ids return the feed unchanged.
#[uniffi::export]
pub fn ffi_accept(events: Vec<FfiActivityEvent>, target_id: u64) -> Vec<FfiActivityEvent> {
    init_logging();
    to_ffi(activity::accept(&to_events(events), target_id))
}

/// Reject a request. Unknown ids return the feed unchanged.
#[uniffi::export]
pub fn ffi_reject(events: Vec<FfiActivityEvent>, target_id: u64) -> Vec<FfiActivityEvent> {
    init_logging();
    to_ffi(activity::reject(&to_events(events), target_id))
}

/// Label for one event. `suffix` is appended to request/accept names.
#[uniffi::export]
pub fn ffi_render_label(event: FfiActivityEvent, suffix: Option<String>) -> String {
    let style = LabelStyle { suffix };
    activity::render_label(&event.into(), &style)
}

// ============================================================================
// Eco Impact
// ============================================================================

/// Haversine distance in km. Returns `None` for invalid coordinates.
#[uniffi::export]
pub fn ffi_great_circle_distance_km(a: GeoPoint, b: GeoPoint) -> Option<f64> {
    init_logging();
    match eco::checked_distance_km(&a, &b) {
        Ok(distance) => Some(distance),
        Err(e) => {
            warn!("[LiftingLadsRust] distance rejected: {}", e);
            None
        }
    }
}

/// Impact of driving `distance_km` with the default factors.
#[uniffi::export]
pub fn ffi_estimate_impact(distance_km: f64) -> Option<TripEstimate> {
    init_logging();
    match eco::checked_estimate(distance_km) {
        Ok(estimate) => Some(estimate),
        Err(e) => {
            warn!("[LiftingLadsRust] estimate rejected: {}", e);
            None
        }
    }
}

/// Distance and impact from the device location to a gym.
#[uniffi::export]
pub fn ffi_estimate_trip(
    origin: GeoPoint,
    gym_name: String,
    gym_location: GeoPoint,
    round_trip: bool,
) -> Option<TripEstimate> {
    init_logging();
    let gym = Gym::new(gym_name, gym_location);
    let config = EcoConfig {
        round_trip,
        ..Default::default()
    };
    match eco::estimate_trip(&origin, &gym, &config) {
        Ok(estimate) => Some(estimate),
        Err(e) => {
            warn!("[LiftingLadsRust] trip estimate rejected: {}", e);
            None
        }
    }
}
