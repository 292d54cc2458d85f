use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// One hourly (or instantaneous) observation. Identity is `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: i32,
    pub pressure: i32,
    /// km/h
    pub wind_speed: f64,
    /// Degrees, 0..=359.
    pub wind_direction: i32,
    /// mm for the hour, 0 when the provider omits it.
    pub precipitation: f64,
    /// mm for the hour, 0 when the provider omits it.
    pub snowfall: f64,
    /// Provider condition id, e.g. 800 for a clear sky.
    pub weather_code: i32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQualitySample {
    pub timestamp: i64,
    pub index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// What the aggregator needs to know about a tour.
#[derive(Debug, Clone)]
pub struct TourQuery {
    pub start: DateTime<Utc>,
    pub elapsed_seconds: i64,
    pub time_zone: Tz,
    pub center: LatLon,
}

impl TourQuery {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.elapsed_seconds)
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + Duration::seconds(self.elapsed_seconds / 2)
    }
}

/// Cloud classification stored on a tour, keyed by the tour application's weather ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloudKind {
    Clear,
    PartlyCloudy,
    Overcast,
    Lightning,
    Rain,
    Snow,
    ScatteredShowers,
    SevereWeather,
}

impl CloudKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudKind::Clear => "weather-sunny",
            CloudKind::PartlyCloudy => "weather-cloudy",
            CloudKind::Overcast => "weather-clouds",
            CloudKind::Lightning => "weather-lightning",
            CloudKind::Rain => "weather-rain",
            CloudKind::Snow => "weather-snow",
            CloudKind::ScatteredShowers => "weather-showers-scattered",
            CloudKind::SevereWeather => "weather-severe",
        }
    }

    /// Maps a provider condition id (see the OpenWeatherMap condition table).
    pub fn from_weather_code(code: i32) -> Option<Self> {
        let kind = match code {
            200..=299 => CloudKind::Lightning,
            300..=399 => CloudKind::ScatteredShowers,
            500..=504 => CloudKind::Rain,
            511 => CloudKind::Snow,
            520..=531 => CloudKind::ScatteredShowers,
            600..=699 => CloudKind::Snow,
            781 => CloudKind::SevereWeather,
            700..=799 => CloudKind::Overcast,
            800 => CloudKind::Clear,
            801 | 802 => CloudKind::PartlyCloudy,
            803 | 804 => CloudKind::Overcast,
            _ => return None,
        };

        Some(kind)
    }
}

impl std::fmt::Display for CloudKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider air quality index scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirQuality {
    Good,
    Fair,
    Moderate,
    Poor,
    VeryPoor,
}

impl AirQuality {
    /// Index outside 1..=5 is clamped into range.
    pub fn from_index(index: i32) -> Self {
        match index.clamp(1, 5) {
            1 => AirQuality::Good,
            2 => AirQuality::Fair,
            3 => AirQuality::Moderate,
            4 => AirQuality::Poor,
            _ => AirQuality::VeryPoor,
        }
    }

    /// Rounded average index of `samples`, `None` when there are none.
    pub fn from_samples(samples: &[AirQualitySample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let sum: i64 = samples.iter().map(|s| i64::from(s.index)).sum();
        let average = sum as f64 / samples.len() as f64;

        Some(Self::from_index(average.round() as i32))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AirQuality::Good => "Good",
            AirQuality::Fair => "Fair",
            AirQuality::Moderate => "Moderate",
            AirQuality::Poor => "Poor",
            AirQuality::VeryPoor => "Very poor",
        }
    }
}

impl std::fmt::Display for AirQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cloud_kind_from_condition_codes() {
        assert_eq!(CloudKind::from_weather_code(211), Some(CloudKind::Lightning));
        assert_eq!(CloudKind::from_weather_code(301), Some(CloudKind::ScatteredShowers));
        assert_eq!(CloudKind::from_weather_code(502), Some(CloudKind::Rain));
        assert_eq!(CloudKind::from_weather_code(511), Some(CloudKind::Snow));
        assert_eq!(CloudKind::from_weather_code(521), Some(CloudKind::ScatteredShowers));
        assert_eq!(CloudKind::from_weather_code(601), Some(CloudKind::Snow));
        assert_eq!(CloudKind::from_weather_code(741), Some(CloudKind::Overcast));
        assert_eq!(CloudKind::from_weather_code(781), Some(CloudKind::SevereWeather));
        assert_eq!(CloudKind::from_weather_code(800), Some(CloudKind::Clear));
        assert_eq!(CloudKind::from_weather_code(802), Some(CloudKind::PartlyCloudy));
        assert_eq!(CloudKind::from_weather_code(804), Some(CloudKind::Overcast));
        assert_eq!(CloudKind::from_weather_code(0), None);
        assert_eq!(CloudKind::from_weather_code(900), None);
    }

    #[test]
    fn air_quality_average_is_rounded() {
        let samples = [
            AirQualitySample { timestamp: 0, index: 2 },
            AirQualitySample { timestamp: 3600, index: 3 },
            AirQualitySample { timestamp: 7200, index: 3 },
        ];

        assert_eq!(AirQuality::from_samples(&samples), Some(AirQuality::Moderate));
        assert_eq!(AirQuality::from_samples(&[]), None);
    }

    #[test]
    fn air_quality_index_is_clamped() {
        assert_eq!(AirQuality::from_index(0), AirQuality::Good);
        assert_eq!(AirQuality::from_index(9), AirQuality::VeryPoor);
        assert_eq!(AirQuality::VeryPoor.label(), "Very poor");
    }

    #[test]
    fn tour_query_end_and_midpoint() {
        let query = TourQuery {
            start: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            elapsed_seconds: 7200,
            time_zone: chrono_tz::UTC,
            center: LatLon::new(47.0, 8.0),
        };

        assert_eq!(query.end().timestamp(), 1_700_007_200);
        assert_eq!(query.midpoint().timestamp(), 1_700_003_600);
    }
}
