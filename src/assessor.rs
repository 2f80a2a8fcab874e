use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{Cache, CachedFetch};
use crate::config::Config;
use crate::error::{Result, RiskError};
use crate::fetcher::{crime, CrimeFetcher, FloodFetcher, GeocodeResolver};
use crate::gateway::HttpGet;
use crate::retry::RetryPolicy;
use crate::scoring::{self, ScoringTables};
use crate::types::{ProductType, RiskAssessment};

/// Composes the pipeline: postcode → coordinates → concurrent crime and
/// flood lookups → scores. One instance serves concurrent assessments; the
/// only shared mutable state is the cache.
pub struct RiskAssessor<G> {
    geocode: GeocodeResolver<G>,
    crime: CrimeFetcher<G>,
    flood: FloodFetcher<G>,
    tables: ScoringTables,
    flood_radius_km: f64,
    deadline: Duration,
}

impl<G: HttpGet> RiskAssessor<G> {
    pub fn new(config: &Config, gateway: Arc<G>, cache: Arc<dyn Cache>) -> Self {
        let cached = Arc::new(CachedFetch::new(cache, config.cache_ttl));
        let retry = RetryPolicy {
            max_attempts: config.retry_max_attempts,
            base_delay: config.retry_base_delay,
            max_delay: config.retry_max_delay,
        };

        Self {
            geocode: GeocodeResolver::new(
                Arc::clone(&gateway),
                Arc::clone(&cached),
                retry.clone(),
                config.geocode_api_url.clone(),
            ),
            crime: CrimeFetcher::new(
                Arc::clone(&gateway),
                Arc::clone(&cached),
                retry.clone(),
                config.crime_api_url.clone(),
            ),
            flood: FloodFetcher::new(gateway, cached, retry, config.flood_api_url.clone()),
            tables: ScoringTables::default(),
            flood_radius_km: config.flood_radius_km,
            deadline: config.assess_deadline,
        }
    }

    /// Override the scoring tables (deployment-specific weighting).
    pub fn with_tables(mut self, tables: ScoringTables) -> Self {
        self.tables = tables;
        self
    }

    /// Assess crime and flood risk for a postcode, date and product.
    ///
    /// Runs under the configured deadline; when it elapses, outstanding
    /// provider calls are dropped and `Timeout` surfaces.
    pub async fn assess(
        &self,
        postcode: &str,
        timestamp: &str,
        product: ProductType,
    ) -> Result<RiskAssessment> {
        match tokio::time::timeout(self.deadline, self.assess_inner(postcode, timestamp, product))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(RiskError::Timeout(self.deadline)),
        }
    }

    async fn assess_inner(
        &self,
        postcode: &str,
        timestamp: &str,
        product: ProductType,
    ) -> Result<RiskAssessment> {
        if postcode.trim().is_empty() {
            return Err(RiskError::Validation("postcode must not be empty".to_string()));
        }
        // Reject a malformed timestamp before any network call is attempted.
        crime::truncate_to_month(timestamp)?;

        let coordinates = self.geocode.resolve(postcode).await?;

        // Independent lookups, issued concurrently. Either failure is
        // terminal — substituting a zero score for a failed fetch would
        // silently understate risk.
        let (crimes, floods) = tokio::try_join!(
            self.crime.fetch(timestamp, coordinates),
            self.flood.fetch(coordinates, self.flood_radius_km),
        )?;

        let crime_risk = scoring::crime_risk(&crimes, product, &self.tables);
        let flood_risk = scoring::flood_risk(&floods, product, &self.tables);
        let band = scoring::classify(crime_risk, flood_risk);

        info!(
            postcode,
            product = %product,
            crime_risk,
            flood_risk,
            band = %band,
            incidents = crimes.len(),
            warnings = floods.len(),
            "assessment complete"
        );

        Ok(RiskAssessment { crime_risk, flood_risk, band, validity_days: band.validity_days() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::gateway::doubles::{Scripted, StubGateway};
    use crate::types::RiskBand;

    const GEOCODE_BODY: &str =
        r#"{"result": {"latitude": 51.501, "longitude": -0.1416}}"#;
    const CRIME_BODY: &str = r#"[{"category": "burglary"}, {"category": "robbery"}]"#;
    const FLOOD_BODY: &str = r#"{"items": [{"severityLevel": 2, "isTidal": false}]}"#;

    fn test_config() -> Config {
        Config {
            geocode_api_url: "https://geocode.test".to_string(),
            crime_api_url: "https://crime.test".to_string(),
            flood_api_url: "https://flood.test".to_string(),
            log_level: "info".to_string(),
            cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(1),
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_millis(1),
            retry_max_delay: Duration::from_millis(2),
            assess_deadline: Duration::from_secs(5),
            flood_radius_km: 50.0,
        }
    }

    fn assessor(gateway: StubGateway) -> (RiskAssessor<StubGateway>, Arc<StubGateway>) {
        let gateway = Arc::new(gateway);
        let assessor =
            RiskAssessor::new(&test_config(), Arc::clone(&gateway), Arc::new(MemoryCache::new()));
        (assessor, gateway)
    }

    fn happy_gateway() -> StubGateway {
        StubGateway::new()
            .route("/postcodes/", vec![Scripted::ok(GEOCODE_BODY)])
            .route("crimes-at-location", vec![Scripted::ok(CRIME_BODY)])
            .route("/id/floods", vec![Scripted::ok(FLOOD_BODY)])
    }

    #[tokio::test]
    async fn end_to_end_scores_follow_the_tables() {
        let (assessor, _) = assessor(happy_gateway());

        let result = assessor.assess("SW1A 1AA", "2024-03-15", ProductType::Home).await.unwrap();

        // burglary (3) + robbery (3) = 6, HOME crime ×1.5 → 9 / 100 → 9.0.
        assert!((result.crime_risk - 9.0).abs() < 1e-9, "crime={}", result.crime_risk);
        // severity 2 → 15, HOME flood ×2.0 → 30 / 200 → 15.0.
        assert!((result.flood_risk - 15.0).abs() < 1e-9, "flood={}", result.flood_risk);
        assert_eq!(result.band, RiskBand::StandardValueRisk);
        assert_eq!(result.validity_days, 14);
    }

    #[tokio::test]
    async fn warm_cache_assessment_is_idempotent_with_no_extra_calls() {
        let (assessor, gateway) = assessor(happy_gateway());

        let first = assessor.assess("SW1A 1AA", "2024-03-15", ProductType::Home).await.unwrap();
        let calls_after_first = gateway.total_calls();
        let second = assessor.assess("SW1A 1AA", "2024-03-15", ProductType::Home).await.unwrap();

        assert_eq!(first.crime_risk, second.crime_risk);
        assert_eq!(first.flood_risk, second.flood_risk);
        assert_eq!(calls_after_first, 3, "cold cache costs one call per provider");
        assert_eq!(gateway.total_calls(), 3, "warm cache must issue zero upstream calls");
    }

    #[tokio::test]
    async fn malformed_timestamp_fails_before_any_network_call() {
        let (assessor, gateway) = assessor(happy_gateway());

        let result = assessor.assess("SW1A 1AA", "2024/03", ProductType::Home).await;

        assert!(matches!(result, Err(RiskError::Validation(_))));
        assert_eq!(gateway.total_calls(), 0);
        assert_eq!(gateway.hits("crimes-at-location"), 0);
    }

    #[tokio::test]
    async fn empty_postcode_fails_before_any_network_call() {
        let (assessor, gateway) = assessor(happy_gateway());

        let result = assessor.assess("  ", "2024-03-15", ProductType::Home).await;

        assert!(matches!(result, Err(RiskError::Validation(_))));
        assert_eq!(gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn geocode_failure_skips_both_data_fetches() {
        let gateway = StubGateway::new()
            .route("/postcodes/", vec![Scripted::status(404)])
            .route("crimes-at-location", vec![Scripted::ok(CRIME_BODY)])
            .route("/id/floods", vec![Scripted::ok(FLOOD_BODY)]);
        let (assessor, gateway) = assessor(gateway);

        let result = assessor.assess("ZZ99 9ZZ", "2024-03-15", ProductType::Home).await;

        assert!(matches!(result, Err(RiskError::Geocode { .. })));
        assert_eq!(gateway.hits("crimes-at-location"), 0);
        assert_eq!(gateway.hits("/id/floods"), 0);
    }

    #[tokio::test]
    async fn failed_crime_fetch_fails_the_assessment() {
        let gateway = StubGateway::new()
            .route("/postcodes/", vec![Scripted::ok(GEOCODE_BODY)])
            .route("crimes-at-location", vec![Scripted::status(500)])
            .route("/id/floods", vec![Scripted::ok(FLOOD_BODY)]);
        let (assessor, gateway) = assessor(gateway);

        let result = assessor.assess("SW1A 1AA", "2024-03-15", ProductType::Home).await;

        // No silent zero score: the provider failure is the result.
        match result {
            Err(RiskError::UpstreamStatus { provider, status }) => {
                assert_eq!(provider, "crime provider");
                assert_eq!(status, 500);
            }
            other => panic!("expected UpstreamStatus, got {other:?}"),
        }
        assert_eq!(gateway.hits("crimes-at-location"), 3, "retry budget applies first");
    }

    #[tokio::test]
    async fn deadline_overrun_surfaces_timeout() {
        struct HangingGateway;
        impl HttpGet for HangingGateway {
            async fn get(
                &self,
                _provider: &'static str,
                _url: &str,
            ) -> Result<crate::gateway::HttpResponse> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                unreachable!("the deadline must cancel this call")
            }
        }

        let mut config = test_config();
        config.assess_deadline = Duration::from_millis(50);
        let assessor =
            RiskAssessor::new(&config, Arc::new(HangingGateway), Arc::new(MemoryCache::new()));

        let result = assessor.assess("SW1A 1AA", "2024-03-15", ProductType::Home).await;
        assert!(matches!(result, Err(RiskError::Timeout(_))));
    }
}
