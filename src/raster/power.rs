//! Darkness to beam power mapping

use crate::types::BeamPower;

/// Linear map from normalized darkness onto the configured power range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerMapper {
    min: f64,
    max: f64,
}

impl PowerMapper {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn from_beam_power(power: &BeamPower) -> Self {
        Self::new(power.min, power.max)
    }

    /// `intensity` is expected in [0, 1]
    pub fn map(&self, intensity: f64) -> f64 {
        intensity * (self.max - self.min) + self.min
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl From<BeamPower> for PowerMapper {
    fn from(power: BeamPower) -> Self {
        Self::from_beam_power(&power)
    }
}
