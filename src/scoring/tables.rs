use std::collections::HashMap;

use crate::types::ProductType;

/// Every scoring knob as plain data. New crime categories or severity levels
/// are additive table entries, not code changes.
#[derive(Debug, Clone)]
pub struct ScoringTables {
    /// Crime category → weight. Categories absent from the table score zero.
    pub crime_weights: HashMap<String, f64>,
    /// Product multipliers for crime scoring. Commercial premises carry the
    /// highest crime exposure.
    pub crime_multipliers: HashMap<ProductType, f64>,
    /// Product multipliers for flood scoring — an independent table, not the
    /// crime one. Homes carry the highest flood exposure.
    pub flood_multipliers: HashMap<ProductType, f64>,
    /// Flood severity level → step score. The provider's severityLevel 1 is
    /// a severe flood warning and 4 means "no longer in force", so the steps
    /// descend with the level.
    pub severity_scores: HashMap<u8, f64>,
    /// Added per flood record when the warning is tidal.
    pub tidal_bonus: f64,
    /// Normalization constant for crime scores.
    pub max_crime_risk: f64,
    /// Normalization constant for flood scores.
    pub max_flood_risk: f64,
    /// Hard ceiling applied after normalization. Raw sums may exceed it, so
    /// the final clamp is load-bearing.
    pub ceiling: f64,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            crime_weights: HashMap::from(
                [
                    ("anti-social-behaviour", 1.0),
                    ("bicycle-theft", 1.0),
                    ("burglary", 3.0),
                    ("criminal-damage-arson", 4.0),
                    ("drugs", 1.5),
                    ("other-crime", 1.0),
                    ("other-theft", 2.0),
                    ("possession-of-weapons", 4.0),
                    ("public-order", 2.0),
                    ("robbery", 3.0),
                    ("shoplifting", 2.0),
                    ("theft-from-the-person", 2.0),
                    ("vehicle-crime", 2.0),
                    ("violent-crime", 4.0),
                ]
                .map(|(category, weight)| (category.to_string(), weight)),
            ),
            crime_multipliers: HashMap::from([
                (ProductType::Beauty, 1.0),
                (ProductType::Home, 1.5),
                (ProductType::Commercial, 2.0),
            ]),
            flood_multipliers: HashMap::from([
                (ProductType::Beauty, 1.0),
                (ProductType::Commercial, 1.5),
                (ProductType::Home, 2.0),
            ]),
            severity_scores: HashMap::from([(1, 20.0), (2, 15.0), (3, 10.0), (4, 0.0)]),
            tidal_bonus: 10.0,
            max_crime_risk: 100.0,
            max_flood_risk: 200.0,
            ceiling: 100.0,
        }
    }
}

impl ScoringTables {
    pub fn crime_weight(&self, category: &str) -> f64 {
        self.crime_weights.get(category).copied().unwrap_or(0.0)
    }

    pub fn crime_multiplier(&self, product: ProductType) -> f64 {
        self.crime_multipliers.get(&product).copied().unwrap_or(1.0)
    }

    pub fn flood_multiplier(&self, product: ProductType) -> f64 {
        self.flood_multipliers.get(&product).copied().unwrap_or(1.0)
    }

    pub fn severity_score(&self, level: u8) -> f64 {
        self.severity_scores.get(&level).copied().unwrap_or(0.0)
    }
}
