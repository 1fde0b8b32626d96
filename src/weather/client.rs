use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::model::WeatherSnapshot;
use crate::appsettings::WeatherSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("weather api returned status {0}")]
    Status(StatusCode),

    #[error("could not decode weather response: {0}")]
    Decode(#[source] reqwest::Error),
}

/// One request, one response. No retry, no concurrent fan-out; a failed
/// lookup is reported to the caller and nothing else.
#[async_trait]
pub trait WeatherFetcher: Send + Sync + 'static {
    /// `query` is an opaque location query: a city name or `"lat,lon"`
    /// coordinates, both accepted by the upstream API.
    async fn fetch(&self, query: &str, days: u8) -> Result<WeatherSnapshot, WeatherError>;
}

pub struct WeatherApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl WeatherApiClient {
    pub fn new(settings: &WeatherSettings) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl WeatherFetcher for WeatherApiClient {
    async fn fetch(&self, query: &str, days: u8) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let days = days.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", query),
                ("days", days.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status()));
        }

        response.json().await.map_err(WeatherError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> WeatherApiClient {
        WeatherApiClient::new(&WeatherSettings {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = client_for("https://api.weatherapi.com/");
        assert_eq!(client.base_url, "https://api.weatherapi.com");
    }

    #[tokio::test]
    #[ignore] // needs network and a real key: cargo test -- --ignored
    async fn live_lookup() {
        let api_key = std::env::var("WEATHER_API_KEY").expect("WEATHER_API_KEY not set");
        let client = WeatherApiClient::new(&WeatherSettings {
            api_key,
            base_url: "https://api.weatherapi.com".to_string(),
        })
        .unwrap();

        let snapshot = client.fetch("Seattle", 1).await.unwrap();
        assert_eq!(snapshot.location.name, "Seattle");
    }
}
