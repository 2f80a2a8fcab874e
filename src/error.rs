use std::time::Duration;
use thiserror::Error;

/// Closed failure taxonomy for the risk pipeline.
///
/// Callers distinguish local, retryable and terminal cases by variant, never
/// by matching on message text.
#[derive(Debug, Error)]
pub enum RiskError {
    /// Malformed local input (unparseable date, empty postcode). Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Postcode could not be resolved to coordinates after retries.
    #[error("geocode error for {postcode}: {reason}")]
    Geocode { postcode: String, reason: String },

    /// Upstream provider answered with a non-success status.
    #[error("{provider} returned HTTP {status}")]
    UpstreamStatus { provider: &'static str, status: u16 },

    /// Transport-level failure reaching an upstream provider.
    #[error("{provider} request failed: {detail}")]
    UpstreamTransport { provider: &'static str, detail: String },

    /// Overall assessment deadline elapsed with calls still outstanding.
    #[error("assessment deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// Cache store unreachable. The fetch layer downgrades this to a miss —
    /// the cache is a cost optimization, not a correctness dependency.
    #[error("cache error: {0}")]
    Cache(String),
}

impl RiskError {
    /// Whether the retry executor may attempt this call again.
    ///
    /// Transport failures and 5xx statuses are transient; client errors and
    /// anything local surface immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            RiskError::UpstreamTransport { .. } => true,
            RiskError::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_and_transport_failures_are_transient() {
        let e = RiskError::UpstreamStatus { provider: "crime provider", status: 503 };
        assert!(e.is_transient());

        let e = RiskError::UpstreamTransport {
            provider: "flood provider",
            detail: "connection reset".to_string(),
        };
        assert!(e.is_transient());
    }

    #[test]
    fn client_and_local_errors_are_not_transient() {
        let e = RiskError::UpstreamStatus { provider: "crime provider", status: 404 };
        assert!(!e.is_transient());

        let e = RiskError::Validation("invalid date format".to_string());
        assert!(!e.is_transient());

        let e = RiskError::Geocode {
            postcode: "SW1A1AA".to_string(),
            reason: "no result".to_string(),
        };
        assert!(!e.is_transient());
    }
}
