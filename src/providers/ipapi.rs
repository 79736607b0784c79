//! IP-based positioning — the device-position source on hosts without
//! a GPS fix.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use super::{Permission, PositionProvider, ProviderError};
use crate::picker::types::Coordinate;

const USER_AGENT: &str = "Fieldpin/0.4";
const TIMEOUT: Duration = Duration::from_secs(10);

/// Position provider backed by ipapi.co. Needs no OS-level permission,
/// so requests always come back granted.
#[derive(Debug, Clone, Default)]
pub struct IpPosition;

impl IpPosition {
    pub fn new() -> Self {
        Self
    }
}

impl PositionProvider for IpPosition {
    fn request_permission(&self) -> Pin<Box<dyn Future<Output = Permission> + Send + '_>> {
        Box::pin(async { Permission::Granted })
    }

    fn current_position(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, ProviderError>> + Send + '_>> {
        Box::pin(async {
            tokio::task::spawn_blocking(fetch_position)
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?
        })
    }
}

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

fn fetch_position() -> Result<Coordinate, ProviderError> {
    let response = ureq::get("https://ipapi.co/json/")
        .set("User-Agent", USER_AGENT)
        .timeout(TIMEOUT)
        .call()
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let r: IpApiResult = response
        .into_json()
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let latitude = r
        .latitude
        .ok_or_else(|| ProviderError::InvalidResponse("no latitude".into()))?;
    let longitude = r
        .longitude
        .ok_or_else(|| ProviderError::InvalidResponse("no longitude".into()))?;

    Ok(Coordinate { latitude, longitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_permission_always_granted() {
        let provider = IpPosition::new();
        assert_eq!(provider.request_permission().await, Permission::Granted);
    }
}
