//! Reverse geocoding via OpenStreetMap Nominatim.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use super::{ProviderError, RawAddress, ReverseGeocoder};
use crate::picker::types::Coordinate;

const USER_AGENT: &str = "Fieldpin/0.4 (field-location-picker)";
const TIMEOUT: Duration = Duration::from_secs(10);

/// The production reverse geocoder.
#[derive(Debug, Clone, Default)]
pub struct Nominatim;

impl Nominatim {
    pub fn new() -> Self {
        Self
    }
}

impl ReverseGeocoder for Nominatim {
    fn reverse_geocode(
        &self,
        coordinate: Coordinate,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RawAddress>, ProviderError>> + Send + '_>> {
        Box::pin(async move {
            // ureq is blocking; keep the picker task free while the
            // request runs.
            tokio::task::spawn_blocking(move || fetch_reverse(coordinate))
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?
        })
    }
}

#[derive(Deserialize)]
struct ReverseResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<OsmAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
struct OsmAddress {
    road: Option<String>,
    suburb: Option<String>,
    city_district: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    postcode: Option<String>,
}

fn fetch_reverse(coordinate: Coordinate) -> Result<Vec<RawAddress>, ProviderError> {
    let url = format!(
        "https://nominatim.openstreetmap.org/reverse?lat={}&lon={}&format=jsonv2&addressdetails=1",
        coordinate.latitude, coordinate.longitude,
    );

    let response = ureq::get(&url)
        .set("User-Agent", USER_AGENT)
        .timeout(TIMEOUT)
        .call()
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let body = response
        .into_string()
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    parse_reverse(&body)
}

/// Parse a Nominatim `/reverse` response body.
///
/// Nominatim reports "unable to geocode" (open ocean, poles) as an
/// `error` field with HTTP 200; that maps to an empty result list, not
/// a failure.
fn parse_reverse(body: &str) -> Result<Vec<RawAddress>, ProviderError> {
    let result: ReverseResult =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    if result.error.is_some() {
        return Ok(vec![]);
    }

    let address = result.address.unwrap_or_default();
    let city = address.city.or(address.town).or(address.village);

    Ok(vec![RawAddress {
        name: result.name.filter(|n| !n.is_empty()),
        street: address.road,
        district: address.suburb.or(address.city_district),
        city,
        postal_code: address.postcode,
    }])
}
