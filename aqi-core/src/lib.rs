//! Core library for the `aqi` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location normalization for the WAQI feed endpoint
//! - The WAQI client behind the `AirQualityProvider` trait, plus a reading cache
//! - AQI classification and the report model shown to users
//!
//! It is used by `aqi-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod report;

pub use cache::{FetchState, ReadingCache};
pub use classify::{PollutionTier, classify};
pub use config::Config;
pub use error::FetchError;
pub use location::Location;
pub use model::AirQualityReading;
pub use provider::{AirQualityProvider, provider_from_config, waqi::WaqiProvider};
pub use report::AirQualityReport;
