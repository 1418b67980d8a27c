//! Core library for the patient forecast view.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The FHIR patient subset and derived location/weather models
//! - OpenWeather geocoding and weather overview lookups
//! - The enrichment orchestrator that keeps the forecast in step with the patient
//!
//! It is used by `forecast-cli`, but can also be embedded in other front ends.

pub mod address;
pub mod config;
pub mod error;
pub mod forecast;
pub mod model;
pub mod orchestrator;
pub mod provider;

pub use address::extract_postal_code;
pub use config::Config;
pub use error::ProviderError;
pub use forecast::{forecast_title, overview_excerpt};
pub use model::{Address, GeoLocation, HumanName, Patient, PatientRef, PostalCode, WeatherOverview};
pub use orchestrator::{EnrichmentOrchestrator, ForecastState, RunOutcome, RunPhase, StopReason};
pub use provider::{GeocodeResolver, OpenWeatherClient, WeatherFetcher, client_from_config};
