//! Core types for the picking session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback focal point when no device position is available on first
/// open: the Waikato region, New Zealand.
pub const DEFAULT_COORDINATE: Coordinate = Coordinate {
    latitude: -37.788289,
    longitude: 175.312474,
};

/// View-rectangle spans used when recentering a map surface.
pub const DEFAULT_LATITUDE_SPAN: f64 = 0.0922;
pub const DEFAULT_LONGITUDE_SPAN: f64 = 0.0421;

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        assert!((-90.0..=90.0).contains(&latitude), "Latitude must be between -90 and 90");
        assert!((-180.0..=180.0).contains(&longitude), "Longitude must be between -180 and 180");
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// The rectangle a map surface should animate to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapRegion {
    pub center: Coordinate,
    pub latitude_span: f64,
    pub longitude_span: f64,
}

impl MapRegion {
    /// A region around `center` with the default spans.
    pub fn around(center: Coordinate) -> Self {
        Self {
            center,
            latitude_span: DEFAULT_LATITUDE_SPAN,
            longitude_span: DEFAULT_LONGITUDE_SPAN,
        }
    }
}

/// Location permission as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Remediation offered to the user when permission is denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Redirect to the system settings screen.
    OpenSettings,
}

/// A human-readable address derived from the focal coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedAddress {
    pub label: String,
    pub city: String,
    pub postal_code: String,
}

impl ResolvedAddress {
    pub fn is_empty(&self) -> bool {
        self.label.is_empty() && self.city.is_empty() && self.postal_code.is_empty()
    }
}

/// The confirmation hand-off payload, emitted once per successful
/// confirm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfirmedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub city: String,
    pub postal_code: String,
}

impl ConfirmedLocation {
    pub fn new(coordinate: Coordinate, address: &ResolvedAddress) -> Self {
        Self {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            label: address.label.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}

/// Picking-session errors. All of these are recoverable and absorbed at
/// the resolver boundary; they only reach callers through the CLI.
#[derive(Debug)]
pub enum PickerError {
    /// Location permission denied; blocks `open()` until re-granted.
    PermissionDenied,
    /// The device position could not be obtained.
    PositionUnavailable(String),
    /// A reverse-geocode call failed.
    GeocodeFailure(String),
}

impl fmt::Display for PickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "Permission to access location was denied"),
            Self::PositionUnavailable(msg) => write!(f, "Device position unavailable: {}", msg),
            Self::GeocodeFailure(msg) => write!(f, "Reverse geocoding failed: {}", msg),
        }
    }
}

impl std::error::Error for PickerError {}
