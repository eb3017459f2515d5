//! # Lifting Lads
//!
//! Client-side domain logic for the Lifting Lads social-fitness app.
//!
//! This library provides:
//! - Activity feed reconciliation (ordering, accept/reject transitions, labels)
//! - Trip eco-impact estimates (haversine distance, CO₂, fuel, travel time)
//! - An optional client for the remote lifting-lad request endpoints
//!
//! ## Features
//!
//! - **`http`** - Enable HTTP client for the lifting-lad request endpoints
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use lifting_lads::{partition_and_order, accept, ActivityEvent, ActivityKind};
//! use lifting_lads::{great_circle_distance_km, estimate_impact, GeoPoint};
//!
//! let feed = vec![
//!     ActivityEvent::accept(2, "Stan", 2),
//!     ActivityEvent::request(1, "Sarah", 1),
//! ];
//! let ordered = partition_and_order(&feed);
//! assert_eq!(ordered[0].actor, "Sarah");
//!
//! let feed = accept(&feed, 1);
//! assert!(feed.iter().all(|e| e.kind() == ActivityKind::Accept));
//!
//! let home = GeoPoint::new(40.7128, -74.0060);
//! let gym = GeoPoint::new(40.7306, -73.9352);
//! let trip = estimate_impact(great_circle_distance_km(&home, &gym));
//! println!("{}", trip.emission_text());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{LadsError, Result};

// Activity feed reconciliation (pure snapshot operations)
pub mod activity;
pub use activity::{
    accept, accept_with, partition_and_order, reject, relative_timestamp, render_label,
    ActivityEvent, ActivityKind, IdSource, LabelStyle, MaxPlusOne, MonotonicIds,
};

// Stateful feed with optimistic/deferred remote mutations
pub mod feed;
pub use feed::{
    events_from_requests, events_from_requests_at, ActivityFeed, ActivityRequest, FeedConfig,
    FriendType, MutationKind, PendingMutation, Session,
};

// Trip distance and eco-impact estimates
pub mod eco;
pub use eco::{
    checked_distance_km, checked_estimate, estimate_impact, estimate_impact_with, estimate_trip,
    great_circle_distance_km, EcoConfig, Gym, TripEstimate,
};

// HTTP module for the remote lifting-lad endpoints
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::FeedClient;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("LiftingLadsRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A WGS-84 coordinate in decimal degrees.
///
/// # Example
/// ```
/// use lifting_lads::GeoPoint;
/// let point = GeoPoint::new(51.5074, -0.1278); // London
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Like [`GeoPoint::is_valid`], but reports which coordinate is wrong.
    ///
    /// `field` names the point in the error (e.g. `"origin"`).
    pub fn validate(&self, field: &str) -> Result<()> {
        let invalid = |message: String| LadsError::InvalidCoordinates {
            field: field.to_string(),
            message,
        };

        if !self.latitude.is_finite() {
            return Err(invalid(format!("latitude {} is not finite", self.latitude)));
        }
        if !self.longitude.is_finite() {
            return Err(invalid(format!(
                "longitude {} is not finite",
                self.longitude
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(invalid(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(invalid(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl From<geo::Point<f64>> for GeoPoint {
    fn from(point: geo::Point<f64>) -> Self {
        // geo uses x = longitude, y = latitude
        GeoPoint::new(point.y(), point.x())
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        geo::Point::new(point.longitude, point.latitude)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(51.5074, -0.1278).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_validate_names_field() {
        let err = GeoPoint::new(f64::NAN, 0.0).validate("origin").unwrap_err();
        match err {
            LadsError::InvalidCoordinates { field, message } => {
                assert_eq!(field, "origin");
                assert!(message.contains("latitude"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = GeoPoint::new(0.0, -200.0).validate("gym").unwrap_err();
        assert!(err.to_string().contains("longitude -200"));

        assert!(GeoPoint::new(-90.0, 180.0).validate("edge").is_ok());
    }

    #[test]
    fn test_geo_point_conversion() {
        let p = GeoPoint::new(40.7128, -74.0060);
        let geo_point: geo::Point<f64> = p.into();
        assert_eq!(geo_point.x(), -74.0060);
        assert_eq!(geo_point.y(), 40.7128);
        assert_eq!(GeoPoint::from(geo_point), p);
    }
}
