use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single 3-hour data point exactly as the forecast feed reported it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub icon_code: Option<String>,
    pub precipitation_probability: Option<f64>, // 0.0-1.0
}

#[cfg(test)]
impl ForecastSample {
    pub fn new(timestamp: DateTime<Utc>, temperature: f64, icon_code: &str) -> Self {
        Self {
            timestamp,
            temperature: Some(temperature),
            icon_code: Some(icon_code.to_string()),
            precipitation_probability: None,
        }
    }

    pub fn with_precipitation(mut self, probability: f64) -> Self {
        self.precipitation_probability = Some(probability);
        self
    }
}

/// Raw feed for one location, before normalization
#[derive(Debug, Clone)]
pub struct ForecastFeed {
    pub city_label: String,
    pub samples: Vec<ForecastSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub label: String, // e.g. "03 PM"
    pub temperature: Option<f64>,
    pub icon_code: Option<String>,
}

/// One local calendar day of samples folded together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub label: String, // e.g. "Mon"
    pub temperature_max: f64,
    pub temperature_min: f64,
    pub temperature_samples: usize,
    pub icon_code: Option<String>,
}

impl DailySummary {
    /// A day where no sample carried a temperature reports 0/0; this tells
    /// the two cases apart.
    pub fn has_temperature(&self) -> bool {
        self.temperature_samples > 0
    }
}

/// Display-ready weather for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city_name: String,
    /// Local date of the current sample
    pub current_date: NaiveDate,
    pub current_temperature: Option<f64>,
    pub rain_chance_percent: u8,
    pub current_icon_code: Option<String>,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailySummary>,
}

impl WeatherSnapshot {
    /// Summary for the current sample's local day, the same day the rain
    /// chance is taken from.
    pub fn today(&self) -> Option<&DailySummary> {
        self.daily.iter().find(|d| d.date == self.current_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(samples: usize) -> DailySummary {
        dated(2, samples)
    }

    fn dated(d: u32, samples: usize) -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2025, 6, d).unwrap(),
            label: "Mon".into(),
            temperature_max: 0.0,
            temperature_min: 0.0,
            temperature_samples: samples,
            icon_code: None,
        }
    }

    #[test]
    fn empty_day_has_no_temperature() {
        assert!(!day(0).has_temperature());
        assert!(day(3).has_temperature());
    }

    #[test]
    fn sample_builder_sets_probability() {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let sample = ForecastSample::new(ts, 12.5, "10d").with_precipitation(0.4);
        assert_eq!(sample.temperature, Some(12.5));
        assert_eq!(sample.icon_code.as_deref(), Some("10d"));
        assert_eq!(sample.precipitation_probability, Some(0.4));
    }

    #[test]
    fn today_follows_current_date_not_first_day() {
        let snapshot = WeatherSnapshot {
            city_name: "Madrid".into(),
            current_date: NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            current_temperature: None,
            rain_chance_percent: 0,
            current_icon_code: None,
            hourly: Vec::new(),
            daily: vec![dated(2, 1), dated(3, 4)],
        };
        assert_eq!(snapshot.today().unwrap().temperature_samples, 4);
    }
}
