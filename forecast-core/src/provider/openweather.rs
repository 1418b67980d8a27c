use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::{
    error::ProviderError,
    model::{GeoLocation, PostalCode, WeatherOverview},
};

use super::{GeocodeResolver, WeatherFetcher};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Only US postal codes are supported.
const COUNTRY_HINT: &str = "US";

/// OpenWeather direct-geocoding and one-call overview client.
///
/// No timeout is configured: an unresponsive endpoint stalls the calling run
/// until the connection gives up on its own.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: Url,
    geocode_url: Url,
    overview_url: Url,
    http: Client,
}

impl OpenWeatherClient {
    pub fn with_base_url(api_key: String, base_url: &str) -> anyhow::Result<Self> {
        let mut base = Url::parse(base_url)
            .with_context(|| format!("Invalid OpenWeather base URL: {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let geocode_url = base
            .join("geo/1.0/zip")
            .context("Failed to build OpenWeather geocoding URL")?;
        let overview_url = base
            .join("data/3.0/onecall/overview")
            .context("Failed to build OpenWeather overview URL")?;

        Ok(Self {
            api_key,
            base_url: base,
            geocode_url,
            overview_url,
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
        what: &'static str,
    ) -> Result<T, ProviderError> {
        let res = self
            .http
            .get(url.clone())
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ProviderError::Malformed { what, source })
    }
}

#[async_trait]
impl GeocodeResolver for OpenWeatherClient {
    async fn resolve_location(
        &self,
        postal_code: &PostalCode,
    ) -> Result<GeoLocation, ProviderError> {
        let zip = format!("{postal_code},{COUNTRY_HINT}");

        self.get_json(&self.geocode_url, &[("zip", zip)], "geocode")
            .await
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    async fn resolve_weather_overview(
        &self,
        location: &GeoLocation,
    ) -> Result<WeatherOverview, ProviderError> {
        let query = [
            ("lat", location.lat.to_string()),
            ("lon", location.lon.to_string()),
        ];

        self.get_json(&self.overview_url, &query, "weather overview")
            .await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
