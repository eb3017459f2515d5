//! Trip eco-impact estimates for the "trip to the gym" calculator.
//!
//! Distance comes from the haversine formula on a spherical Earth; CO₂,
//! fuel and travel time are linear in distance. The factors are fixed
//! assumptions, not measurements.
//!
//! ## Example
//! ```rust
//! use lifting_lads::eco::{estimate_trip, EcoConfig, Gym};
//! use lifting_lads::GeoPoint;
//!
//! let home = GeoPoint::new(51.5074, -0.1278);
//! let gym = Gym::new("Iron Temple", GeoPoint::new(51.5155, -0.0922));
//! let trip = estimate_trip(&home, &gym, &EcoConfig::default()).unwrap();
//! println!("{}", trip.emission_text());
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{GeoPoint, LadsError, Result};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Configuration for impact estimates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoConfig {
    /// kg of CO₂ emitted per km driven.
    /// Default: 0.12
    pub emission_kg_per_km: f64,

    /// Fuel economy in km per litre.
    /// Default: 12.0
    pub km_per_liter: f64,

    /// Average driving speed in km/h.
    /// Default: 50.0
    pub average_speed_kmh: f64,

    /// Count the way back too (doubles the distance).
    /// Default: false
    #[serde(default)]
    pub round_trip: bool,
}

impl Default for EcoConfig {
    fn default() -> Self {
        Self {
            emission_kg_per_km: 0.12,
            km_per_liter: 12.0,
            average_speed_kmh: 50.0,
            round_trip: false,
        }
    }
}

impl EcoConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject factors that would divide by zero or produce negative values.
    pub fn validate(&self) -> Result<()> {
        if !self.emission_kg_per_km.is_finite() || self.emission_kg_per_km < 0.0 {
            return Err(LadsError::Config {
                message: format!(
                    "emission_kg_per_km must be non-negative, got {}",
                    self.emission_kg_per_km
                ),
            });
        }
        for (name, value) in [
            ("km_per_liter", self.km_per_liter),
            ("average_speed_kmh", self.average_speed_kmh),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LadsError::Config {
                    message: format!("{} must be positive, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}

/// Destination picked in the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gym {
    pub name: String,
    pub location: GeoPoint,
}

impl Gym {
    pub fn new(name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// Estimated cost of one trip. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TripEstimate {
    /// Distance the factors were applied to, in km
    pub distance_km: f64,
    pub co2_kg: f64,
    pub fuel_liters: f64,
    pub travel_minutes: f64,
}

impl TripEstimate {
    pub fn emission_text(&self) -> String {
        format!("Estimated carbon emission: {:.2} kg CO₂", self.co2_kg)
    }

    pub fn fuel_text(&self) -> String {
        format!("Estimated fuel use: {:.2} L", self.fuel_liters)
    }

    pub fn travel_text(&self) -> String {
        format!("Estimated travel time: {:.0} min", self.travel_minutes)
    }
}

/// Great-circle distance between two points in km (haversine, R = 6371 km).
///
/// Inputs are not validated; NaN in gives NaN out. Use
/// [`checked_distance_km`] for untrusted coordinates.
pub fn great_circle_distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Clamp guards asin against h creeping past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// [`great_circle_distance_km`] with both points validated first.
pub fn checked_distance_km(a: &GeoPoint, b: &GeoPoint) -> Result<f64> {
    a.validate("origin")?;
    b.validate("destination")?;
    Ok(great_circle_distance_km(a, b))
}

/// Impact of driving `distance_km` with the default factors.
pub fn estimate_impact(distance_km: f64) -> TripEstimate {
    estimate_impact_with(distance_km, &EcoConfig::default())
}

/// Impact of driving `distance_km` with custom factors.
pub fn estimate_impact_with(distance_km: f64, config: &EcoConfig) -> TripEstimate {
    let distance_km = if config.round_trip {
        distance_km * 2.0
    } else {
        distance_km
    };

    TripEstimate {
        distance_km,
        co2_kg: distance_km * config.emission_kg_per_km,
        fuel_liters: distance_km / config.km_per_liter,
        travel_minutes: (distance_km / config.average_speed_kmh) * 60.0,
    }
}

/// [`estimate_impact`] that rejects negative or non-finite distances.
pub fn checked_estimate(distance_km: f64) -> Result<TripEstimate> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(LadsError::InvalidDistance { value: distance_km });
    }
    Ok(estimate_impact(distance_km))
}

/// Distance and impact from `origin` to `gym` in one call.
pub fn estimate_trip(origin: &GeoPoint, gym: &Gym, config: &EcoConfig) -> Result<TripEstimate> {
    origin.validate("origin")?;
    gym.location.validate(&format!("gym '{}'", gym.name))?;

    let distance = great_circle_distance_km(origin, &gym.location);
    let estimate = estimate_impact_with(distance, config);
    debug!(
        "[Eco] trip to {}: {:.2} km, {:.2} kg CO2",
        gym.name, estimate.distance_km, estimate.co2_kg
    );
    Ok(estimate)
}

// ============================================================================
// Tests
// ============================================================================
