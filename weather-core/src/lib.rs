//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Classification of user input into a city or postal-code lookup
//! - The OpenWeatherMap client behind the [`WeatherProvider`] trait
//! - Rendering of the current-weather report
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod classify;
pub mod config;
pub mod model;
pub mod provider;
pub mod render;

pub use classify::{InvalidInput, classify, classify_with_country};
pub use config::{Config, DeclinedDemo, ProbeConfig};
pub use model::{DEFAULT_COUNTRY, LocationQuery, ProviderError, RawResponse, Units, WeatherReport};
pub use provider::{FetchError, OpenWeatherClient, ProbeOutcome, WeatherProvider};
pub use render::{compass, demo_report, render};
