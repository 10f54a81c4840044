pub mod ipapi;
pub mod openweathermap;

pub use ipapi::IpApiClient;
pub use openweathermap::OpenWeatherMapClient;

use crate::config::Units;
use crate::error::Result;
use crate::models::{ForecastFeed, GeoLocation};
use async_trait::async_trait;

/// Turns a free-form city name into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, city: &str) -> Result<GeoLocation>;
}

/// Supplies the raw 3-hour forecast for a coordinate pair.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn forecast(&self, latitude: f64, longitude: f64, units: Units)
        -> Result<ForecastFeed>;
}

/// Best guess at where the user is, used once at startup.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn current_location(&self) -> Result<GeoLocation>;
}

/// Ask `source` for the current location, falling back to `fallback` on any
/// failure.
pub async fn locate_or_default(source: &dyn LocationSource, fallback: GeoLocation) -> GeoLocation {
    match source.current_location().await {
        Ok(location) => {
            tracing::info!("Located via IP: {}", location.display_name());
            location
        }
        Err(e) => {
            tracing::warn!(
                "Location detection failed, using {}: {}",
                fallback.name,
                e
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherlyError;

    struct FixedLocation(Option<GeoLocation>);

    #[async_trait]
    impl LocationSource for FixedLocation {
        async fn current_location(&self) -> Result<GeoLocation> {
            self.0
                .clone()
                .ok_or_else(|| WeatherlyError::Network("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn located_city_is_used() {
        let source = FixedLocation(Some(GeoLocation::new("Porto", 41.15, -8.61)));
        let loc = locate_or_default(&source, GeoLocation::new("Madrid", 40.4168, -3.7038)).await;
        assert_eq!(loc.name, "Porto");
    }

    #[tokio::test]
    async fn failure_falls_back_to_default() {
        let source = FixedLocation(None);
        let loc = locate_or_default(&source, GeoLocation::new("Madrid", 40.4168, -3.7038)).await;
        assert_eq!(loc.name, "Madrid");
        assert_eq!(loc.latitude, 40.4168);
    }
}
