use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::cache::CachedFetch;
use crate::error::{Result, RiskError};
use crate::gateway::HttpGet;
use crate::retry::RetryPolicy;
use crate::types::{Coordinates, FloodRecord};

const PROVIDER: &str = "flood provider";

/// Envelope returned by the flood monitoring service. A missing `items`
/// array means no active warnings.
#[derive(Debug, Deserialize)]
struct FloodResponse {
    #[serde(default)]
    items: Vec<FloodRecord>,
}

/// Fetches active flood warnings around a coordinate through the cache.
pub struct FloodFetcher<G> {
    gateway: Arc<G>,
    cache: Arc<CachedFetch>,
    retry: RetryPolicy,
    base_url: String,
}

impl<G: HttpGet> FloodFetcher<G> {
    pub fn new(
        gateway: Arc<G>,
        cache: Arc<CachedFetch>,
        retry: RetryPolicy,
        base_url: String,
    ) -> Self {
        Self { gateway, cache, retry, base_url }
    }

    /// Fetch active flood warnings within `radius_km` of a coordinate. An
    /// empty warning list is a valid, cacheable result.
    pub async fn fetch(&self, coordinates: Coordinates, radius_km: f64) -> Result<Vec<FloodRecord>> {
        let key = format!(
            "flood:{}:{}:{radius_km}",
            coordinates.latitude, coordinates.longitude
        );
        self.cache.get_or_fetch(&key, || self.fetch_warnings(coordinates, radius_km)).await
    }

    async fn fetch_warnings(
        &self,
        coordinates: Coordinates,
        radius_km: f64,
    ) -> Result<Vec<FloodRecord>> {
        let url = format!(
            "{}/id/floods?lat={}&long={}&dist={radius_km}",
            self.base_url, coordinates.latitude, coordinates.longitude
        );

        let response = self
            .retry
            .execute(|| async {
                self.gateway.get(PROVIDER, &url).await?.ensure_success(PROVIDER)
            })
            .await?;

        let parsed: FloodResponse =
            serde_json::from_str(&response.body).map_err(|e| RiskError::UpstreamTransport {
                provider: PROVIDER,
                detail: format!("undecodable body: {e}"),
            })?;

        debug!(
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            radius_km,
            count = parsed.items.len(),
            "flood warnings fetched"
        );
        Ok(parsed.items)
    }
}
