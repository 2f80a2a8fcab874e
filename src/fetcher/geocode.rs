use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::cache::CachedFetch;
use crate::error::{Result, RiskError};
use crate::gateway::HttpGet;
use crate::retry::RetryPolicy;
use crate::types::Coordinates;

const PROVIDER: &str = "geocode provider";

/// Envelope returned by the postcode lookup service. A 2xx body without both
/// coordinate fields counts as "no result".
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    result: Option<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Resolves postcodes to coordinates through the cache.
pub struct GeocodeResolver<G> {
    gateway: Arc<G>,
    cache: Arc<CachedFetch>,
    retry: RetryPolicy,
    base_url: String,
}

impl<G: HttpGet> GeocodeResolver<G> {
    pub fn new(
        gateway: Arc<G>,
        cache: Arc<CachedFetch>,
        retry: RetryPolicy,
        base_url: String,
    ) -> Self {
        Self { gateway, cache, retry, base_url }
    }

    /// Resolve a postcode to coordinates, consulting the cache first.
    ///
    /// The postcode is normalized (whitespace stripped, uppercased) before
    /// the cache key is derived, so "SW1A 1AA" and "sw1a1aa" share one entry
    /// and a warm cache makes no upstream call for either spelling.
    pub async fn resolve(&self, postcode: &str) -> Result<Coordinates> {
        let normalized = normalize_postcode(postcode);
        if normalized.is_empty() {
            return Err(RiskError::Validation("postcode must not be empty".to_string()));
        }

        let key = format!("geocode:{normalized}");
        self.cache.get_or_fetch(&key, || self.fetch_coordinates(normalized.clone())).await
    }

    async fn fetch_coordinates(&self, postcode: String) -> Result<Coordinates> {
        let url = format!("{}/postcodes/{}", self.base_url, postcode);

        let response = self
            .retry
            .execute(|| async {
                self.gateway.get(PROVIDER, &url).await?.ensure_success(PROVIDER)
            })
            .await;

        let response = match response {
            Ok(r) => r,
            // Resolution failures are terminal for the assessment; fold the
            // exhausted upstream error into the geocode taxonomy.
            Err(RiskError::UpstreamStatus { status, .. }) => {
                return Err(RiskError::Geocode {
                    postcode,
                    reason: format!("upstream status {status}"),
                })
            }
            Err(RiskError::UpstreamTransport { detail, .. }) => {
                return Err(RiskError::Geocode { postcode, reason: detail })
            }
            Err(e) => return Err(e),
        };

        let parsed: GeocodeResponse = match serde_json::from_str(&response.body) {
            Ok(p) => p,
            Err(_) => return Err(no_result(postcode)),
        };

        let coordinates = match parsed.result {
            Some(GeocodeResult { latitude: Some(latitude), longitude: Some(longitude) }) => {
                Coordinates { latitude, longitude }
            }
            _ => return Err(no_result(postcode)),
        };

        debug!(
            postcode = %postcode,
            latitude = coordinates.latitude,
            longitude = coordinates.longitude,
            "postcode resolved"
        );
        Ok(coordinates)
    }
}

fn no_result(postcode: String) -> RiskError {
    RiskError::Geocode { postcode, reason: "no result".to_string() }
}

/// Strip all whitespace and uppercase, collapsing spelling variants onto one
/// cache key.
pub fn normalize_postcode(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase()
}
