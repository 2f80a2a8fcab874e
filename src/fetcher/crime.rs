use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::cache::CachedFetch;
use crate::error::{Result, RiskError};
use crate::gateway::HttpGet;
use crate::retry::RetryPolicy;
use crate::types::{Coordinates, CrimeRecord};

const PROVIDER: &str = "crime provider";

/// Fetches crime incidents near a coordinate through the cache.
pub struct CrimeFetcher<G> {
    gateway: Arc<G>,
    cache: Arc<CachedFetch>,
    retry: RetryPolicy,
    base_url: String,
}

impl<G: HttpGet> CrimeFetcher<G> {
    pub fn new(
        gateway: Arc<G>,
        cache: Arc<CachedFetch>,
        retry: RetryPolicy,
        base_url: String,
    ) -> Self {
        Self { gateway, cache, retry, base_url }
    }

    /// Fetch the crime incidents for the month of `date` at a coordinate.
    ///
    /// The provider publishes at year-month resolution, so the cache key and
    /// the upstream query both use the truncated date: two assessments for
    /// the same location and month reuse one upstream call. An empty incident
    /// list is a valid, cacheable result.
    pub async fn fetch(&self, date: &str, coordinates: Coordinates) -> Result<Vec<CrimeRecord>> {
        let month = truncate_to_month(date)?;
        let key = format!("crime:{month}:{}:{}", coordinates.latitude, coordinates.longitude);
        self.cache.get_or_fetch(&key, || self.fetch_incidents(month.clone(), coordinates)).await
    }

    async fn fetch_incidents(
        &self,
        month: String,
        coordinates: Coordinates,
    ) -> Result<Vec<CrimeRecord>> {
        let url = format!(
            "{}/crimes-at-location?date={month}&lat={}&lng={}",
            self.base_url, coordinates.latitude, coordinates.longitude
        );

        let response = self
            .retry
            .execute(|| async {
                self.gateway.get(PROVIDER, &url).await?.ensure_success(PROVIDER)
            })
            .await?;

        let incidents: Vec<CrimeRecord> =
            serde_json::from_str(&response.body).map_err(|e| RiskError::UpstreamTransport {
                provider: PROVIDER,
                detail: format!("undecodable body: {e}"),
            })?;

        debug!(month = %month, count = incidents.len(), "crime incidents fetched");
        Ok(incidents)
    }
}

/// Strict `YYYY-MM-DD` parse truncated to `YYYY-MM`. A trailing time
/// component ("2024-03-15 10:30:00") is tolerated because quote timestamps
/// carry one; anything else is rejected before any network I/O.
pub(crate) fn truncate_to_month(raw: &str) -> Result<String> {
    let date_part = raw.split_whitespace().next().unwrap_or_default();
    let parsed = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        RiskError::Validation(format!("invalid date format {raw:?}, expected YYYY-MM-DD"))
    })?;
    Ok(parsed.format("%Y-%m").to_string())
}
