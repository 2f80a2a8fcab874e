use serde::{Deserialize, Serialize};

use crate::error::RiskError;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Resolved location of a postcode. Immutable once produced; shared read-only
/// by the crime and flood fetchers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Provider records
// ---------------------------------------------------------------------------

/// One crime incident from the crime provider. Only `category` drives
/// scoring; the rest is metadata kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub category: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub location: Option<CrimeLocation>,
}

/// The crime provider serializes coordinates as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeLocation {
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

/// One active flood warning from the flood provider.
///
/// `severityLevel` follows the provider's convention: 1 is a severe flood
/// warning, 4 means the warning is no longer in force. A missing level is
/// treated as 4, matching the provider's "inactive" end of the scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloodRecord {
    #[serde(default = "inactive_severity")]
    pub severity_level: u8,
    #[serde(default)]
    pub is_tidal: bool,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn inactive_severity() -> u8 {
    4
}

// ---------------------------------------------------------------------------
// Product types
// ---------------------------------------------------------------------------

/// Insured product category. Each carries its own crime and flood multiplier
/// in the scoring tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductType {
    Beauty,
    Home,
    Commercial,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductType::Beauty => "BEAUTY",
            ProductType::Home => "HOME",
            ProductType::Commercial => "COMMERCIAL",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ProductType {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BEAUTY" => Ok(ProductType::Beauty),
            "HOME" => Ok(ProductType::Home),
            "COMMERCIAL" => Ok(ProductType::Commercial),
            other => Err(RiskError::Validation(format!("unknown product type: {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Assessment result
// ---------------------------------------------------------------------------

/// Band derived from the combined crime and flood score; drives how long a
/// quote stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskBand {
    HighValueRisk,
    StandardValueRisk,
}

impl RiskBand {
    /// Validity period of a quote in this band, in days.
    pub fn validity_days(self) -> u32 {
        match self {
            RiskBand::HighValueRisk => 7,
            RiskBand::StandardValueRisk => 14,
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskBand::HighValueRisk => "HIGH_VALUE_RISK",
            RiskBand::StandardValueRisk => "STANDARD_VALUE_RISK",
        };
        write!(f, "{s}")
    }
}

/// Outcome of one assessment. Scores are clamped to [0, 100].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub crime_risk: f64,
    pub flood_risk: f64,
    pub band: RiskBand,
    pub validity_days: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_type_parses_case_insensitively() {
        assert_eq!("home".parse::<ProductType>().unwrap(), ProductType::Home);
        assert_eq!(" COMMERCIAL ".parse::<ProductType>().unwrap(), ProductType::Commercial);
        assert!("CARAVAN".parse::<ProductType>().is_err());
    }

    #[test]
    fn flood_record_defaults_missing_fields() {
        let record: FloodRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.severity_level, 4);
        assert!(!record.is_tidal);

        let record: FloodRecord =
            serde_json::from_str(r#"{"severityLevel": 2, "isTidal": true}"#).unwrap();
        assert_eq!(record.severity_level, 2);
        assert!(record.is_tidal);
    }

    #[test]
    fn crime_record_needs_only_a_category() {
        let record: CrimeRecord = serde_json::from_str(r#"{"category": "burglary"}"#).unwrap();
        assert_eq!(record.category, "burglary");
        assert!(record.location.is_none());
    }

    #[test]
    fn band_validity_periods() {
        assert_eq!(RiskBand::HighValueRisk.validity_days(), 7);
        assert_eq!(RiskBand::StandardValueRisk.validity_days(), 14);
    }
}
