use crate::scoring::tables::ScoringTables;
use crate::types::{CrimeRecord, FloodRecord, ProductType, RiskBand};

/// Crime risk for a product at a location, in [0, 100].
///
/// Sums the per-category weight of every record (duplicates included — the
/// provider's duplicates are real incidents), scales by the product's crime
/// multiplier, then normalizes. An empty record list scores 0.
pub fn crime_risk(records: &[CrimeRecord], product: ProductType, tables: &ScoringTables) -> f64 {
    let raw: f64 = records.iter().map(|r| tables.crime_weight(&r.category)).sum();
    normalize(raw * tables.crime_multiplier(product), tables.max_crime_risk, tables.ceiling)
}

/// Flood risk for a product at a location, in [0, 100].
///
/// Each warning contributes its severity step score plus the tidal bonus when
/// tidal; the sum is scaled by the product's flood multiplier and normalized.
/// An empty warning list scores 0.
pub fn flood_risk(records: &[FloodRecord], product: ProductType, tables: &ScoringTables) -> f64 {
    let raw: f64 = records
        .iter()
        .map(|r| {
            let step = tables.severity_score(r.severity_level);
            if r.is_tidal {
                step + tables.tidal_bonus
            } else {
                step
            }
        })
        .sum();
    normalize(raw * tables.flood_multiplier(product), tables.max_flood_risk, tables.ceiling)
}

/// Band the combined score: anything above 100 is high value, which shortens
/// the quote validity period.
pub fn classify(crime_risk: f64, flood_risk: f64) -> RiskBand {
    if crime_risk + flood_risk > 100.0 {
        RiskBand::HighValueRisk
    } else {
        RiskBand::StandardValueRisk
    }
}

/// Rescale a raw sum against its maximum onto 0–ceiling. Raw sums are
/// unbounded above, so the clamp is a required final step, not a no-op.
fn normalize(raw: f64, max_risk: f64, ceiling: f64) -> f64 {
    ((raw / max_risk) * ceiling).clamp(0.0, ceiling)
}
