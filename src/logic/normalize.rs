use crate::error::{Result, WeatherlyError};
use crate::models::{DailySummary, ForecastSample, HourlyPoint, WeatherSnapshot};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fmt::Display;

pub const MAX_HOURLY_POINTS: usize = 7;
pub const MAX_DAILY_SUMMARIES: usize = 7;

const HOUR_LABEL_FORMAT: &str = "%I %p";
const DAY_LABEL_FORMAT: &str = "%a";

/// Normalize a 3-hour forecast feed into current, hourly and daily views,
/// grouping days by the machine's local timezone.
///
/// `samples` are expected in ascending timestamp order. They are not sorted
/// here; out-of-order input produces a best-effort result.
pub fn normalize(
    samples: &[ForecastSample],
    city_name: &str,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot> {
    normalize_in(samples, city_name, now, &Local)
}

/// Same as [`normalize`], with an explicit timezone for labels and day grouping.
pub fn normalize_in<Tz>(
    samples: &[ForecastSample],
    city_name: &str,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<WeatherSnapshot>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if samples.is_empty() {
        return Err(WeatherlyError::EmptyForecast);
    }

    let current_index = select_current(samples, now);
    let current = &samples[current_index];

    let hourly = samples[current_index..]
        .iter()
        .take(MAX_HOURLY_POINTS)
        .map(|sample| HourlyPoint {
            label: sample
                .timestamp
                .with_timezone(tz)
                .format(HOUR_LABEL_FORMAT)
                .to_string(),
            temperature: sample.temperature,
            icon_code: sample.icon_code.clone(),
        })
        .collect();

    let days = group_by_local_date(samples, tz);

    let today = local_date(current, tz);
    let rain_chance_percent = days
        .get(&today)
        .and_then(DayAccumulator::max_precipitation)
        .map(probability_to_percent)
        .unwrap_or(0);

    let daily = days
        .into_iter()
        .take(MAX_DAILY_SUMMARIES)
        .map(|(date, acc)| acc.into_summary(date))
        .collect();

    Ok(WeatherSnapshot {
        city_name: city_name.to_string(),
        current_date: today,
        current_temperature: current.temperature,
        rain_chance_percent,
        current_icon_code: current.icon_code.clone(),
        hourly,
        daily,
    })
}

/// Index of the first sample at or after `now`, or 0 when every sample is in
/// the past.
fn select_current(samples: &[ForecastSample], now: DateTime<Utc>) -> usize {
    samples
        .iter()
        .position(|s| s.timestamp >= now)
        .unwrap_or(0)
}

fn local_date<Tz: TimeZone>(sample: &ForecastSample, tz: &Tz) -> NaiveDate {
    sample.timestamp.with_timezone(tz).date_naive()
}

fn group_by_local_date<Tz: TimeZone>(
    samples: &[ForecastSample],
    tz: &Tz,
) -> BTreeMap<NaiveDate, DayAccumulator> {
    let mut by_date: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for sample in samples {
        by_date
            .entry(local_date(sample, tz))
            .or_default()
            .add(sample);
    }
    by_date
}

fn probability_to_percent(probability: f64) -> u8 {
    // NaN saturates to 0 in the cast
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Default)]
struct DayAccumulator {
    max: Option<f64>,
    min: Option<f64>,
    temperature_samples: usize,
    // (icon, count) in first-seen order
    icons: Vec<(String, usize)>,
    max_precipitation: Option<f64>,
}

impl DayAccumulator {
    fn add(&mut self, sample: &ForecastSample) {
        if let Some(temp) = sample.temperature.filter(|t| t.is_finite()) {
            self.max = Some(self.max.map_or(temp, |m| m.max(temp)));
            self.min = Some(self.min.map_or(temp, |m| m.min(temp)));
            self.temperature_samples += 1;
        }

        if let Some(icon) = sample.icon_code.as_deref() {
            match self.icons.iter_mut().find(|(code, _)| code == icon) {
                Some((_, count)) => *count += 1,
                None => self.icons.push((icon.to_string(), 1)),
            }
        }

        if let Some(pop) = sample.precipitation_probability {
            self.max_precipitation = Some(self.max_precipitation.map_or(pop, |p| p.max(pop)));
        }
    }

    fn max_precipitation(&self) -> Option<f64> {
        self.max_precipitation
    }

    /// Most frequent icon; the earliest one wins a tie.
    fn dominant_icon(&self) -> Option<String> {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.icons {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(code, _)| code.clone())
    }

    fn into_summary(self, date: NaiveDate) -> DailySummary {
        DailySummary {
            date,
            label: date.format(DAY_LABEL_FORMAT).to_string(),
            temperature_max: self.max.unwrap_or(0.0),
            temperature_min: self.min.unwrap_or(0.0),
            temperature_samples: self.temperature_samples,
            icon_code: self.dominant_icon(),
        }
    }
}
