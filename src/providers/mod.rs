//! Position and reverse-geocoding providers.
//!
//! Both collaborators are black boxes behind object-safe traits so the
//! picker can run against the production HTTP backends or scripted
//! test doubles.

pub mod ipapi;
pub mod nominatim;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::picker::types::Coordinate;

pub use ipapi::IpPosition;
pub use nominatim::Nominatim;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// One reverse-geocode result as returned by a provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAddress {
    pub name: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// Provider failures.
#[derive(Debug)]
pub enum ProviderError {
    Network(String),
    InvalidResponse(String),
    PermissionDenied,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
            Self::PermissionDenied => write!(f, "Location permission denied"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Supplies the current device coordinates and permission status.
pub trait PositionProvider: Send + Sync + 'static {
    /// Ask for (or re-check) location permission.
    fn request_permission(&self) -> Pin<Box<dyn Future<Output = Permission> + Send + '_>>;

    /// The current device position.
    fn current_position(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, ProviderError>> + Send + '_>>;
}

/// Resolves a coordinate pair to human-readable address candidates.
pub trait ReverseGeocoder: Send + Sync + 'static {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawAddress>, ProviderError>> + Send + '_>>;
}
