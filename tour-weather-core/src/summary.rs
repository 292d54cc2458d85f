use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    model::{AirQuality, CloudKind, LatLon},
    sample_set::SampleAggregate,
};

/// Weather computed for one tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TourWeatherSummary {
    pub weather: Option<SampleAggregate>,
    pub air_quality: Option<AirQuality>,
}

impl TourWeatherSummary {
    pub fn is_empty(&self) -> bool {
        self.weather.is_none() && self.air_quality.is_none()
    }

    /// Writes every available field onto `tour`. When only air quality is
    /// known, its label becomes the weather description and the other weather
    /// fields are left untouched.
    pub fn apply_to<T: TourRecord + ?Sized>(&self, tour: &mut T) {
        if let Some(weather) = &self.weather {
            tour.set_weather_description(weather.description.clone());
            tour.set_weather_clouds(weather.clouds);
            tour.set_temperature_average(weather.temperature_average);
            tour.set_temperature_min(weather.temperature_min);
            tour.set_temperature_max(weather.temperature_max);
            tour.set_temperature_feels_like(weather.feels_like_average);
            tour.set_humidity(weather.humidity_average);
            tour.set_pressure(weather.pressure_average);
            tour.set_precipitation(weather.precipitation_total);
            tour.set_snowfall(weather.snowfall_total);
            tour.set_wind_speed(weather.wind_speed_average);
            tour.set_wind_direction(weather.wind_direction);
        } else if let Some(air_quality) = self.air_quality {
            tour.set_weather_description(format!("Air quality: {air_quality}"));
        }

        if let Some(air_quality) = self.air_quality {
            tour.set_air_quality(air_quality);
        }
    }
}

/// A recorded tour as seen by the aggregator: a handful of getters and one
/// setter per weather field.
pub trait TourRecord {
    fn start_time(&self) -> DateTime<Utc>;
    fn elapsed_seconds(&self) -> i64;
    /// IANA time zone id, e.g. "Europe/Berlin".
    fn time_zone_id(&self) -> &str;
    fn search_center(&self) -> LatLon;

    fn set_weather_description(&mut self, description: String);
    fn set_weather_clouds(&mut self, clouds: Option<CloudKind>);
    fn set_temperature_average(&mut self, value: f64);
    fn set_temperature_min(&mut self, value: f64);
    fn set_temperature_max(&mut self, value: f64);
    fn set_temperature_feels_like(&mut self, value: f64);
    fn set_humidity(&mut self, value: f64);
    fn set_pressure(&mut self, value: f64);
    fn set_precipitation(&mut self, value: f64);
    fn set_snowfall(&mut self, value: f64);
    fn set_wind_speed(&mut self, value: f64);
    fn set_wind_direction(&mut self, degrees: i32);
    fn set_air_quality(&mut self, air_quality: AirQuality);
}

/// Plain in-memory tour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub start: DateTime<Utc>,
    pub elapsed_seconds: i64,
    pub time_zone_id: String,
    pub center: LatLon,

    pub weather_description: String,
    pub weather_clouds: Option<CloudKind>,
    pub temperature_average: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub temperature_feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub precipitation: f64,
    pub snowfall: f64,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub air_quality: Option<AirQuality>,
}

impl Tour {
    pub fn new(
        start: DateTime<Utc>,
        elapsed_seconds: i64,
        time_zone_id: impl Into<String>,
        center: LatLon,
    ) -> Self {
        Self {
            start,
            elapsed_seconds,
            time_zone_id: time_zone_id.into(),
            center,
            weather_description: String::new(),
            weather_clouds: None,
            temperature_average: 0.0,
            temperature_min: 0.0,
            temperature_max: 0.0,
            temperature_feels_like: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            precipitation: 0.0,
            snowfall: 0.0,
            wind_speed: 0.0,
            wind_direction: 0,
            air_quality: None,
        }
    }
}

impl TourRecord for Tour {
    fn start_time(&self) -> DateTime<Utc> {
        self.start
    }

    fn elapsed_seconds(&self) -> i64 {
        self.elapsed_seconds
    }

    fn time_zone_id(&self) -> &str {
        &self.time_zone_id
    }

    fn search_center(&self) -> LatLon {
        self.center
    }

    fn set_weather_description(&mut self, description: String) {
        self.weather_description = description;
    }

    fn set_weather_clouds(&mut self, clouds: Option<CloudKind>) {
        self.weather_clouds = clouds;
    }

    fn set_temperature_average(&mut self, value: f64) {
        self.temperature_average = value;
    }

    fn set_temperature_min(&mut self, value: f64) {
        self.temperature_min = value;
    }

    fn set_temperature_max(&mut self, value: f64) {
        self.temperature_max = value;
    }

    fn set_temperature_feels_like(&mut self, value: f64) {
        self.temperature_feels_like = value;
    }

    fn set_humidity(&mut self, value: f64) {
        self.humidity = value;
    }

    fn set_pressure(&mut self, value: f64) {
        self.pressure = value;
    }

    fn set_precipitation(&mut self, value: f64) {
        self.precipitation = value;
    }

    fn set_snowfall(&mut self, value: f64) {
        self.snowfall = value;
    }

    fn set_wind_speed(&mut self, value: f64) {
        self.wind_speed = value;
    }

    fn set_wind_direction(&mut self, degrees: i32) {
        self.wind_direction = degrees;
    }

    fn set_air_quality(&mut self, air_quality: AirQuality) {
        self.air_quality = Some(air_quality);
    }
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass text for a direction in degrees.
pub fn wind_direction_text(degrees: i32) -> &'static str {
    let normalized = f64::from(degrees.rem_euclid(360));
    let index = ((normalized / 22.5).round() as usize) % COMPASS_POINTS.len();
    COMPASS_POINTS[index]
}
