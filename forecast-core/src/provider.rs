use crate::{
    Config,
    error::ProviderError,
    model::{GeoLocation, PostalCode, WeatherOverview},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Resolves a postal code to coordinates.
#[async_trait]
pub trait GeocodeResolver: Send + Sync + Debug {
    async fn resolve_location(&self, postal_code: &PostalCode)
    -> Result<GeoLocation, ProviderError>;
}

/// Resolves coordinates to a free-text weather overview.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    async fn resolve_weather_overview(
        &self,
        location: &GeoLocation,
    ) -> Result<WeatherOverview, ProviderError>;
}

/// Construct the OpenWeather client from resolved configuration.
///
/// A missing API key is not an error here: every request will simply be
/// rejected upstream.
pub fn client_from_config(config: &Config) -> anyhow::Result<Arc<OpenWeatherClient>> {
    let api_key = config.api_key().unwrap_or_else(|| {
        tracing::warn!("No OpenWeather API key configured; lookups will fail");
        ""
    });

    Ok(Arc::new(OpenWeatherClient::with_base_url(
        api_key.to_owned(),
        config.base_url(),
    )?))
}
