//! Weather and geocoding lookups
//!
//! Talks to an OpenWeather-compatible provider directly (not through
//! [`crate::http::ApiClient`]; the provider knows nothing about FinTrip
//! sessions). Both lookups go through a [`TimedCache`]:
//!
//! - geocoding results under `geo_<place>`
//! - daily forecasts under `weather_<lat>,<lon>_<date>`
//!
//! An unknown place or a date outside the forecast window is reported as
//! [`FintripError::NotFound`] and is not cached, so the next call asks the
//! provider again.

use crate::cache::{Clock, TimedCache};
use crate::config::WeatherConfig;
use crate::error::{FintripError, Result};
use crate::storage::{keys, ClientStorage};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub mod types;
pub use types::{ForecastSlot, GeoLocation, PlaceWeather, WeatherSnapshot};

use types::ForecastResponse;

/// Cached weather client
pub struct WeatherService {
    http_client: reqwest::Client,
    config: WeatherConfig,
    geo_cache: TimedCache<GeoLocation>,
    forecast_cache: TimedCache<WeatherSnapshot>,
}

impl WeatherService {
    /// Build a service whose caches live in `storage` and expire after `ttl`.
    pub fn new(
        config: WeatherConfig,
        timeout: Duration,
        storage: Arc<dyn ClientStorage>,
        ttl: chrono::Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FintripError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config,
            geo_cache: TimedCache::new(storage.clone(), keys::GEO_CACHE_PREFIX).with_ttl(ttl),
            forecast_cache: TimedCache::new(storage, keys::WEATHER_CACHE_PREFIX).with_ttl(ttl),
        })
    }

    /// Use `clock` for both caches.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.geo_cache = self.geo_cache.with_clock(clock.clone());
        self.forecast_cache = self.forecast_cache.with_clock(clock);
        self
    }

    /// Drop expired entries from both caches. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        Ok(self.geo_cache.purge_expired()? + self.forecast_cache.purge_expired()?)
    }

    /// Resolve a place name to coordinates.
    ///
    /// # Errors
    ///
    /// [`FintripError::Validation`] for an empty name,
    /// [`FintripError::NotFound`] when the provider knows no such place.
    pub async fn geocode(&self, place: &str) -> Result<GeoLocation> {
        let place = place.trim();
        if place.is_empty() {
            return Err(FintripError::Validation("Place name is required".into()).into());
        }

        let key = place.to_lowercase();
        self.geo_cache
            .get_or_fetch(&key, || self.fetch_geocode(place))
            .await
    }

    /// Daily forecast for a coordinate.
    ///
    /// # Errors
    ///
    /// [`FintripError::NotFound`] when the provider has no slot on `date`.
    pub async fn forecast(&self, lat: f64, lon: f64, date: NaiveDate) -> Result<WeatherSnapshot> {
        let key = forecast_key(lat, lon, date);
        self.forecast_cache
            .get_or_fetch(&key, || self.fetch_forecast(lat, lon, date))
            .await
    }

    /// Geocode `place`, then fetch its forecast for `date`.
    pub async fn weather_for_place(&self, place: &str, date: NaiveDate) -> Result<PlaceWeather> {
        let location = self.geocode(place).await?;
        let weather = self.forecast(location.lat, location.lon, date).await?;
        Ok(PlaceWeather { location, weather })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                FintripError::Config(
                    "Weather API key is not set (FINTRIP_WEATHER_API_KEY)".to_string(),
                )
                .into()
            })
    }

    async fn fetch_geocode(&self, place: &str) -> Result<GeoLocation> {
        let url = format!("{}/direct", self.config.geocoding_url.trim_end_matches('/'));
        let query = [
            ("q", place.to_string()),
            ("limit", "1".to_string()),
            ("appid", self.api_key()?.to_string()),
        ];

        let results: Vec<GeoLocation> = self.get_provider(&url, &query).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| FintripError::NotFound("Location not found".into()).into())
    }

    async fn fetch_forecast(&self, lat: f64, lon: f64, date: NaiveDate) -> Result<WeatherSnapshot> {
        let url = format!("{}/forecast", self.config.forecast_url.trim_end_matches('/'));
        let query = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("appid", self.api_key()?.to_string()),
            ("units", self.config.units.clone()),
        ];

        let response: ForecastResponse = self.get_provider(&url, &query).await?;
        summarize(lat, lon, date, &self.config.units, &response).ok_or_else(|| {
            FintripError::NotFound(format!("No forecast available for {}", date)).into()
        })
    }

    async fn get_provider<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                // the URL carries the API key
                let e = e.without_url();
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    e.to_string()
                };
                FintripError::Transport(format!("weather provider request failed: {}", reason))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FintripError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FintripError::Transport(format!("Failed to read response body: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Cache key for a coordinate and day.
pub fn forecast_key(lat: f64, lon: f64, date: NaiveDate) -> String {
    format!("{:.4},{:.4}_{}", lat, lon, date.format("%Y-%m-%d"))
}

/// Collapse the three-hour slots that fall on `date` (in the city's local
/// time) into one daily summary.
fn summarize(
    lat: f64,
    lon: f64,
    date: NaiveDate,
    units: &str,
    response: &ForecastResponse,
) -> Option<WeatherSnapshot> {
    let offset_secs = response.city.as_ref().map(|c| c.timezone).unwrap_or(0);
    let offset = i32::try_from(offset_secs)
        .ok()
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    let items: Vec<_> = response
        .list
        .iter()
        .filter_map(|item| {
            let time = DateTime::<Utc>::from_timestamp(item.dt, 0)?;
            (time.with_timezone(&offset).date_naive() == date).then_some((time, item))
        })
        .collect();

    if items.is_empty() {
        return None;
    }

    let count = items.len() as f64;
    let temp_min = items
        .iter()
        .map(|(_, i)| i.main.temp_min)
        .fold(f64::INFINITY, f64::min);
    let temp_max = items
        .iter()
        .map(|(_, i)| i.main.temp_max)
        .fold(f64::NEG_INFINITY, f64::max);
    let temp_avg = items.iter().map(|(_, i)| i.main.temp).sum::<f64>() / count;
    let humidity_avg = items.iter().map(|(_, i)| i.main.humidity).sum::<f64>() / count;
    let wind_speed_max = items
        .iter()
        .filter_map(|(_, i)| i.wind.as_ref().map(|w| w.speed))
        .fold(0.0, f64::max);

    let slots: Vec<ForecastSlot> = items
        .iter()
        .map(|(time, item)| {
            let condition = item.weather.first();
            ForecastSlot {
                time: *time,
                temp: item.main.temp,
                description: condition.map(|c| c.description.clone()).unwrap_or_default(),
                icon: condition.map(|c| c.icon.clone()).unwrap_or_default(),
            }
        })
        .collect();

    let (description, icon) = dominant_condition(&slots);

    Some(WeatherSnapshot {
        latitude: lat,
        longitude: lon,
        date,
        units: units.to_string(),
        temp_min,
        temp_max,
        temp_avg,
        humidity_avg,
        wind_speed_max,
        description,
        icon,
        slots,
    })
}

/// Most frequent description across slots; ties go to the earliest slot.
fn dominant_condition(slots: &[ForecastSlot]) -> (String, String) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for slot in slots {
        *counts.entry(slot.description.as_str()).or_default() += 1;
    }

    let mut best: Option<(&ForecastSlot, usize)> = None;
    for slot in slots {
        let n = counts[slot.description.as_str()];
        if best.map_or(true, |(_, m)| n > m) {
            best = Some((slot, n));
        }
    }

    best.map(|(slot, _)| (slot.description.clone(), slot.icon.clone()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn forecast_json() -> ForecastResponse {
        // 2024-05-01 in UTC+7: slots at 00:00, 03:00, 06:00 local plus one on the next day
        let base = Utc.with_ymd_and_hms(2024, 4, 30, 17, 0, 0).unwrap().timestamp();
        serde_json::from_value(serde_json::json!({
            "city": {"timezone": 25200},
            "list": [
                {"dt": base, "main": {"temp": 26.0, "temp_min": 25.0, "temp_max": 27.0, "humidity": 80.0},
                 "weather": [{"description": "light rain", "icon": "10n"}], "wind": {"speed": 2.0}},
                {"dt": base + 3 * 3600, "main": {"temp": 28.0, "temp_min": 27.5, "temp_max": 29.0, "humidity": 70.0},
                 "weather": [{"description": "few clouds", "icon": "02d"}], "wind": {"speed": 4.5}},
                {"dt": base + 6 * 3600, "main": {"temp": 30.0, "temp_min": 29.0, "temp_max": 31.0, "humidity": 60.0},
                 "weather": [{"description": "few clouds", "icon": "02d"}], "wind": {"speed": 3.0}},
                {"dt": base + 24 * 3600, "main": {"temp": 20.0, "temp_min": 10.0, "temp_max": 40.0, "humidity": 10.0},
                 "weather": [{"description": "clear sky", "icon": "01d"}]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize_uses_local_date() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let snapshot = summarize(21.03, 105.85, date, "metric", &forecast_json()).unwrap();

        assert_eq!(snapshot.slots.len(), 3);
        assert_eq!(snapshot.temp_min, 25.0);
        assert_eq!(snapshot.temp_max, 31.0);
        assert_eq!(snapshot.temp_avg, 28.0);
        assert_eq!(snapshot.humidity_avg, 70.0);
        assert_eq!(snapshot.wind_speed_max, 4.5);
        assert_eq!(snapshot.description, "few clouds");
        assert_eq!(snapshot.icon, "02d");
        assert_eq!(snapshot.units, "metric");
    }

    #[test]
    fn test_summarize_outside_window_is_none() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(summarize(0.0, 0.0, date, "metric", &forecast_json()).is_none());
    }

    #[test]
    fn test_forecast_key_format() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            forecast_key(21.0294498, 105.8544441, date),
            "21.0294,105.8544_2024-05-01"
        );
    }

    #[test]
    fn test_dominant_condition_tie_goes_to_earliest() {
        let t = Utc::now();
        let slot = |d: &str, i: &str| ForecastSlot {
            time: t,
            temp: 0.0,
            description: d.into(),
            icon: i.into(),
        };
        let slots = vec![slot("rain", "10d"), slot("sun", "01d")];
        assert_eq!(
            dominant_condition(&slots),
            ("rain".to_string(), "10d".to_string())
        );
        assert_eq!(dominant_condition(&[]), (String::new(), String::new()));
    }
}
