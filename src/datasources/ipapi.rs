use crate::config::Config;
use crate::datasources::LocationSource;
use crate::error::{Result, WeatherlyError};
use crate::models::GeoLocation;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const LOOKUP_TIMEOUT_SECS: u64 = 5;

/// IP-based geolocation through ip-api.com (free, no key)
pub struct IpApiClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default, rename = "countryCode")]
    country_code: Option<String>,
}

impl IpApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.endpoints.ip_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LocationSource for IpApiClient {
    async fn current_location(&self) -> Result<GeoLocation> {
        let url = format!("{}/json", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WeatherlyError::Network(format!("ip-api: {}", e)))?;

        if !response.status().is_success() {
            return Err(WeatherlyError::Network(format!(
                "ip-api returned {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            WeatherlyError::MalformedResponse(format!("Failed to parse ip-api response: {}", e))
        })?;

        if body.status != "success" {
            return Err(WeatherlyError::Network(format!(
                "Location lookup failed: {}",
                body.message.unwrap_or_else(|| body.status.clone())
            )));
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(GeoLocation {
                name: body.city.unwrap_or_else(|| "Unknown".to_string()),
                latitude,
                longitude,
                country: body.country_code,
            }),
            _ => Err(WeatherlyError::MalformedResponse(
                "ip-api response has no coordinates".into(),
            )),
        }
    }
}
