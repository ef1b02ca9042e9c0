use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Daily weather summary for one coordinate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    pub date: NaiveDate,
    pub units: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_avg: f64,
    pub humidity_avg: f64,
    pub wind_speed_max: f64,
    pub description: String,
    pub icon: String,
    pub slots: Vec<ForecastSlot>,
}

/// One three-hour forecast slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSlot {
    pub time: DateTime<Utc>,
    pub temp: f64,
    pub description: String,
    pub icon: String,
}

/// Weather for a named place
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceWeather {
    pub location: GeoLocation,
    pub weather: WeatherSnapshot,
}

// provider wire format

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastItem>,
    #[serde(default)]
    pub city: Option<ForecastCity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastCity {
    /// Offset from UTC in seconds
    #[serde(default)]
    pub timezone: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastItem {
    pub dt: i64,
    pub main: ForecastMain,
    #[serde(default)]
    pub weather: Vec<ForecastCondition>,
    #[serde(default)]
    pub wind: Option<ForecastWind>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastMain {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastCondition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForecastWind {
    #[serde(default)]
    pub speed: f64,
}
