//! Location risk assessment pipeline for insurance quotes.
//!
//! Resolves a postcode to coordinates, pulls crime incidents and active
//! flood warnings from public providers (cached, retried), and normalizes
//! them into bounded per-product risk scores. The request-handling layer
//! that calls [`RiskAssessor::assess`] lives outside this crate.

pub mod assessor;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gateway;
pub mod retry;
pub mod scoring;
pub mod types;

pub use assessor::RiskAssessor;
pub use error::{Result, RiskError};
pub use types::{Coordinates, ProductType, RiskAssessment, RiskBand};
