use crate::{Config, FetchError, Location, model::AirQualityReading, provider::waqi::WaqiProvider};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod waqi;

#[async_trait]
pub trait AirQualityProvider: Send + Sync + Debug {
    /// Fetch the current reading and forecast for `location`.
    async fn fetch(
        &self,
        location: &Location,
        token: &str,
    ) -> Result<AirQualityReading, FetchError>;
}

/// Construct the WAQI provider, honouring an endpoint override from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn AirQualityProvider>> {
    let provider = match config.endpoint.as_deref() {
        Some(endpoint) => WaqiProvider::with_base_url(endpoint)?,
        None => WaqiProvider::new(),
    };

    Ok(Arc::new(provider))
}
