use serde::{Deserialize, Serialize};

/// Geographic position in WGS84 degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const ORIGIN: LatLng = LatLng::new(0.0, 0.0);

    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// True when the position lies inside the WGS84 latitude/longitude ranges.
    pub fn in_range(&self) -> bool {
        self.is_finite() && (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A position fix reported by the host (browser geolocation or GPS).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocationFix {
    pub position: LatLng,
    /// 95% confidence radius reported by the host, in meters.
    pub accuracy_m: f64,
}

impl LocationFix {
    pub fn new(position: LatLng, accuracy_m: f64) -> Self {
        Self {
            position,
            accuracy_m,
        }
    }

    /// Radius of the circle drawn around the fix.
    pub fn display_radius_m(&self) -> f64 {
        (self.accuracy_m / 2.0).max(0.0)
    }
}
