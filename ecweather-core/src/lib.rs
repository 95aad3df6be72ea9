//! Core library for the Canadian weather stations dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The provider abstraction and the Environment Canada implementation
//! - Shared domain models (stations, readings, climate history)
//! - The error taxonomy surfaced to the dashboard
//!
//! It is used by `ecweather-dashboard`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use config::{Config, DashboardConfig, ProviderConfig, ServerConfig};
pub use error::WeatherError;
pub use model::{
    ClimateStation, DailyRecord, History, Language, Measurement, Mode, Province, Site, StationId,
    StationSelector, WeatherData, WeatherReading, WeatherRequest,
};
pub use provider::{WeatherProvider, eccc::EcccProvider, fetch};
