pub mod engine;
pub mod tables;

pub use engine::{classify, crime_risk, flood_risk};
pub use tables::ScoringTables;
