//! Core library for the `geoweather` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - One-shot position lookup ([`GeoProvider`])
//! - The OpenWeather client ([`WeatherProvider`])
//! - The location → weather workflow and the host seams it runs against
//!
//! It is used by `geoweather-cli`, but any host that implements
//! [`HostPlatform`] and [`Presenter`] can drive the same workflow.

pub mod config;
pub mod error;
pub mod geo;
pub mod host;
pub mod model;
pub mod provider;
pub mod workflow;

pub use config::{Config, LocationSource, PermissionSetting};
pub use error::{FetchError, FetchFailure, LocationError, WorkflowError};
pub use geo::{GeoProvider, Precision};
pub use host::{
    Failure, HostPlatform, Permission, PermissionReport, PermissionStatus, Presenter,
    SettingsScreen,
};
pub use model::{Condition, Coordinates, Units, WeatherQuery, WeatherResult};
pub use provider::WeatherProvider;
pub use workflow::{Outcome, RunReport, WeatherWorkflow, WorkflowState};
