use async_trait::async_trait;

use crate::{Coordinates, LocationError};

use super::{GeoProvider, Precision};

/// Location source that always reports a position entered by the user.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    position: Coordinates,
}

impl FixedLocator {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

#[async_trait]
impl GeoProvider for FixedLocator {
    async fn current_position(&self, _precision: Precision) -> Result<Coordinates, LocationError> {
        if !self.position.latitude.is_finite()
            || !self.position.longitude.is_finite()
            || self.position.latitude.abs() > 90.0
            || self.position.longitude.abs() > 180.0
        {
            return Err(LocationError::Unavailable(format!(
                "configured position {} is out of range",
                self.position
            )));
        }

        Ok(self.position)
    }
}
