//! Deserialization of provider responses into samples.

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::model::{AirQualitySample, WeatherSample};

const MPS_TO_KMH: f64 = 3.6;

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: i32,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwVolume {
    #[serde(rename = "1h", default)]
    one_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwHour {
    dt: i64,
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    pressure: i32,
    #[serde(default)]
    humidity: i32,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    wind_deg: i32,
    #[serde(default)]
    rain: Option<OwVolume>,
    #[serde(default)]
    snow: Option<OwVolume>,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

impl From<OwHour> for WeatherSample {
    fn from(hour: OwHour) -> Self {
        let (weather_code, description) = hour
            .weather
            .into_iter()
            .next()
            .map(|w| (w.id, w.description))
            .unwrap_or_else(|| (0, String::new()));

        WeatherSample {
            timestamp: hour.dt,
            temperature: hour.temp,
            feels_like: hour.feels_like,
            humidity: hour.humidity,
            pressure: hour.pressure,
            wind_speed: hour.wind_speed * MPS_TO_KMH,
            wind_direction: hour.wind_deg.rem_euclid(360),
            precipitation: hour.rain.map(|r| r.one_hour).unwrap_or(0.0),
            snowfall: hour.snow.map(|s| s.one_hour).unwrap_or(0.0),
            weather_code,
            description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    current: OwHour,
}

/// One Call 3.0 timemachine answers with `data`, the older 2.5 API with `hourly`.
#[derive(Debug, Deserialize)]
struct OwHistoricalResponse {
    #[serde(default)]
    hourly: Vec<OwHour>,
    #[serde(default)]
    data: Vec<OwHour>,
}

#[derive(Debug, Deserialize)]
struct OwAirMain {
    aqi: i32,
}

#[derive(Debug, Deserialize)]
struct OwAirEntry {
    dt: i64,
    main: OwAirMain,
}

#[derive(Debug, Deserialize)]
struct OwAirPollutionResponse {
    #[serde(default)]
    list: Vec<OwAirEntry>,
}

pub fn parse_current(body: &str) -> Result<WeatherSample> {
    let parsed: OwCurrentResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather current JSON")?;

    Ok(parsed.current.into())
}

/// Samples of one historical page, sorted by timestamp.
pub fn parse_hourly_page(body: &str) -> Result<Vec<WeatherSample>> {
    let parsed: OwHistoricalResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather timemachine JSON")?;

    let mut samples: Vec<WeatherSample> =
        parsed.hourly.into_iter().chain(parsed.data).map(WeatherSample::from).collect();
    samples.sort_by_key(|s| s.timestamp);

    Ok(samples)
}

pub fn parse_air_pollution(body: &str) -> Result<Vec<AirQualitySample>> {
    let parsed: OwAirPollutionResponse =
        serde_json::from_str(body).context("Failed to parse OpenWeather air pollution JSON")?;

    parsed
        .list
        .into_iter()
        .map(|entry| {
            if entry.main.aqi < 1 {
                return Err(anyhow!("Invalid air quality index {} at {}", entry.main.aqi, entry.dt));
            }
            Ok(AirQualitySample { timestamp: entry.dt, index: entry.main.aqi })
        })
        .collect()
}
