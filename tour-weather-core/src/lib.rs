//! Core library for enriching recorded tours with historical weather.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The sample set that de-duplicates, filters and aggregates hourly observations
//! - The aggregator that pages through provider history for one tour
//! - An abstraction over the weather source, with an OpenWeatherMap implementation
//! - A daily request budget
//!
//! It is used by `tour-weather-cli`, but can also be embedded by any application that stores tours.

pub mod aggregator;
pub mod budget;
pub mod config;
pub mod error;
pub mod model;
pub mod sample_set;
pub mod source;
pub mod summary;

pub use aggregator::{Clock, HistoricalWeatherAggregator, SystemClock};
pub use budget::{FileRequestBudget, MemoryRequestBudget, RequestBudget};
pub use config::Config;
pub use error::StepError;
pub use model::{AirQuality, AirQualitySample, CloudKind, LatLon, TourQuery, WeatherSample};
pub use sample_set::{SampleAggregate, WeatherSampleSet};
pub use source::{OpenWeatherSource, WeatherSource};
pub use summary::{Tour, TourRecord, TourWeatherSummary, wind_direction_text};
