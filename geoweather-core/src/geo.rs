use crate::{Config, Coordinates, LocationError, config::LocationSource};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod fixed;
pub mod ip;

pub use fixed::FixedLocator;
pub use ip::IpLocator;

/// Accuracy requested from the positioning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    HighAccuracy,
}

/// One-shot access to the host's current position.
///
/// A call asks for a single fix and resolves with the first one received;
/// implementations hold nothing once it returns.
#[async_trait]
pub trait GeoProvider: Send + Sync + Debug {
    async fn current_position(&self, precision: Precision) -> Result<Coordinates, LocationError>;
}

/// Stand-in for a location source that is turned off. Never produces a fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLocator;

#[async_trait]
impl GeoProvider for DisabledLocator {
    async fn current_position(&self, _precision: Precision) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable(
            "location source is turned off".to_string(),
        ))
    }
}

/// Construct the locator for the configured location source.
pub fn locator_from_config(config: &Config) -> Box<dyn GeoProvider> {
    match config.location {
        LocationSource::Ip => Box::new(IpLocator::default()),
        LocationSource::Fixed {
            latitude,
            longitude,
        } => Box::new(FixedLocator::new(Coordinates::new(latitude, longitude))),
        LocationSource::Off => Box::new(DisabledLocator),
    }
}
