use std::time::Duration;

use crate::error::{Result, RiskError};

pub const GEOCODE_API_URL: &str = "https://api.postcodes.io";
pub const CRIME_API_URL: &str = "https://data.police.uk/api";
pub const FLOOD_API_URL: &str = "https://environment.data.gov.uk/flood-monitoring";

/// TTL applied to every cache entry kind in the pipeline (24 h).
pub const CACHE_TTL_SECS: u64 = 86_400;

/// Per-attempt HTTP timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Upstream retry budget: attempts and backoff shape. The base delay doubles
/// per retry and each sleep is capped, bounding wall-clock per fetch.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 200;
pub const RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Overall deadline for one assessment (seconds).
pub const ASSESS_DEADLINE_SECS: u64 = 30;

/// Flood warning search radius around the resolved coordinates (km).
pub const FLOOD_RADIUS_KM: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub geocode_api_url: String,
    pub crime_api_url: String,
    pub flood_api_url: String,
    pub log_level: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub retry_max_attempts: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub assess_deadline: Duration,
    pub flood_radius_km: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            geocode_api_url: base_url("GEOCODE_API_URL", GEOCODE_API_URL),
            crime_api_url: base_url("CRIME_API_URL", CRIME_API_URL),
            flood_api_url: base_url("FLOOD_API_URL", FLOOD_API_URL),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            cache_ttl: Duration::from_secs(parse_var("CACHE_TTL_SECS", CACHE_TTL_SECS)?),
            request_timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                REQUEST_TIMEOUT_SECS,
            )?),
            retry_max_attempts: parse_var("RETRY_MAX_ATTEMPTS", RETRY_MAX_ATTEMPTS)?,
            retry_base_delay: Duration::from_millis(parse_var(
                "RETRY_BASE_DELAY_MS",
                RETRY_BASE_DELAY_MS,
            )?),
            retry_max_delay: Duration::from_millis(parse_var(
                "RETRY_MAX_DELAY_MS",
                RETRY_MAX_DELAY_MS,
            )?),
            assess_deadline: Duration::from_secs(parse_var(
                "ASSESS_DEADLINE_SECS",
                ASSESS_DEADLINE_SECS,
            )?),
            flood_radius_km: parse_var("FLOOD_RADIUS_KM", FLOOD_RADIUS_KM)?,
        })
    }
}

/// Env override for a provider base URL, with trailing slashes stripped so
/// path joins stay predictable.
fn base_url(var: &str, default: &str) -> String {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().trim_end_matches('/').to_string(),
        _ => default.to_string(),
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, default: T) -> Result<T> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| RiskError::Validation(format!("{var} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}
