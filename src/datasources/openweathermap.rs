use crate::config::{Config, Units};
use crate::datasources::{ForecastSource, Geocoder};
use crate::error::{Result, WeatherlyError};
use crate::models::{ForecastFeed, ForecastSample, GeoLocation};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const FORECAST_PATH: &str = "/data/2.5/forecast";
const GEOCODE_PATH: &str = "/geo/1.0/direct";

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    geo_base: String,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: OwmCity,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    #[serde(default)]
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    #[serde(default)]
    pop: Option<f64>, // probability of precipitation
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    #[serde(default)]
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmGeocodeEntry {
    name: String,
    lat: f64,
    lon: f64,
    #[serde(default)]
    country: Option<String>,
}

impl OpenWeatherMapClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_base: config.endpoints.api_base.trim_end_matches('/').to_string(),
            geo_base: config.endpoints.geo_base.trim_end_matches('/').to_string(),
        })
    }

    /// GET `url` and decode the JSON body, keeping transport failures and
    /// undecodable payloads apart.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response =
            self.client.get(url).send().await.map_err(|e| {
                WeatherlyError::Network(format!("OpenWeatherMap: {}", e.without_url()))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WeatherlyError::Network(format!("OpenWeatherMap: {}", e.without_url())))?;

        if !status.is_success() {
            return Err(WeatherlyError::Network(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            WeatherlyError::MalformedResponse(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })
    }

    fn url(&self, base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}{}", base, path), params)
            .map_err(|e| WeatherlyError::Config(format!("Invalid OpenWeatherMap URL: {}", e)))
    }

    fn convert_response(response: OwmForecastResponse) -> Result<ForecastFeed> {
        let samples = response
            .list
            .into_iter()
            .map(Self::convert_forecast_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(ForecastFeed {
            city_label: response.city.name,
            samples,
        })
    }

    fn convert_forecast_item(item: OwmForecastItem) -> Result<ForecastSample> {
        let timestamp = DateTime::from_timestamp(item.dt, 0).ok_or_else(|| {
            WeatherlyError::MalformedResponse(format!("timestamp out of range: {}", item.dt))
        })?;

        Ok(ForecastSample {
            timestamp,
            temperature: item.main.and_then(|m| m.temp),
            icon_code: item.weather.into_iter().next().and_then(|w| w.icon),
            precipitation_probability: item.pop,
        })
    }
}

#[async_trait]
impl Geocoder for OpenWeatherMapClient {
    async fn resolve(&self, city: &str) -> Result<GeoLocation> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherlyError::CityNotFound(String::new()));
        }

        let url = self.url(
            &self.geo_base,
            GEOCODE_PATH,
            &[("q", city), ("limit", "1"), ("appid", self.api_key.as_str())],
        )?;

        let entries: Vec<OwmGeocodeEntry> = self.get_json(url).await?;
        let entry = entries
            .into_iter()
            .next()
            .ok_or_else(|| WeatherlyError::CityNotFound(city.to_string()))?;

        tracing::debug!(
            "Resolved '{}' to {} ({}, {})",
            city,
            entry.name,
            entry.lat,
            entry.lon
        );

        Ok(GeoLocation {
            name: entry.name,
            latitude: entry.lat,
            longitude: entry.lon,
            country: entry.country,
        })
    }
}

#[async_trait]
impl ForecastSource for OpenWeatherMapClient {
    /// Fetch 5-day/3-hour forecast from OpenWeatherMap
    async fn forecast(&self, latitude: f64, longitude: f64, units: Units) -> Result<ForecastFeed> {
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let url = self.url(
            &self.api_base,
            FORECAST_PATH,
            &[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", units.as_query()),
                ("appid", self.api_key.as_str()),
            ],
        )?;

        let response: OwmForecastResponse = self.get_json(url).await?;
        let feed = Self::convert_response(response)?;
        tracing::debug!(
            "Fetched {} forecast samples for {}",
            feed.samples.len(),
            feed.city_label
        );
        Ok(feed)
    }
}
