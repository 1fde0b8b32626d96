//! The consumed subset of the weatherapi.com forecast response. The
//! upstream schema carries far more; unknown fields are ignored on decode.

use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: Current,
    #[serde(default)]
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Current {
    pub temp_c: f64,
    pub temp_f: f64,
    pub condition: Condition,
    pub humidity: u8,
    pub wind_mph: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub day: Day,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Day {
    pub avgtemp_f: f64,
    pub maxtemp_f: f64,
    pub mintemp_f: f64,
    pub condition: Condition,
    pub daily_chance_of_rain: u8,
}
