use std::path::PathBuf;

use chrono::NaiveTime;
use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize, Debug, Clone)]
pub struct TelegramSettings {
    pub token: String,
    /// Chat that receives the daily weather summary.
    pub chat_id: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NotificationDefaults {
    /// Fire time used when re-arming the daily slot after a restart. The
    /// time picked interactively is not persisted.
    #[serde(default = "default_fire_at", deserialize_with = "fire_time")]
    pub default_fire_at: NaiveTime,
    /// Timezone the fire time is interpreted in.
    #[serde(default = "default_timezone", deserialize_with = "timezone")]
    pub timezone: Tz,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            default_fire_at: default_fire_at(),
            timezone: default_timezone(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub telegram: TelegramSettings,
    pub weather: WeatherSettings,
    #[serde(default)]
    pub notification: NotificationDefaults,
    #[serde(default)]
    pub storage: StorageSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("appsettings").required(true))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

fn default_base_url() -> String {
    "https://api.weatherapi.com".to_string()
}

fn default_fire_at() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).expect("valid time")
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_data_file() -> PathBuf {
    PathBuf::from("dailycast.json")
}

fn fire_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
}

fn timezone<'de, D>(deserializer: D) -> Result<Tz, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_defaults_parse_from_config_values() {
        let defaults: NotificationDefaults = serde_json::from_value(serde_json::json!({
            "default_fire_at": "07:30",
            "timezone": "America/New_York",
        }))
        .unwrap();

        assert_eq!(
            defaults.default_fire_at,
            NaiveTime::from_hms_opt(7, 30, 0).unwrap()
        );
        assert_eq!(defaults.timezone, Tz::America__New_York);
    }

    #[test]
    fn invalid_fire_time_is_rejected() {
        let result: Result<NotificationDefaults, _> = serde_json::from_value(serde_json::json!({
            "default_fire_at": "quarter past nine",
        }));

        assert!(result.is_err());
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let defaults: NotificationDefaults = serde_json::from_value(serde_json::json!({})).unwrap();

        assert_eq!(
            defaults.default_fire_at,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(defaults.timezone, Tz::UTC);
    }
}
