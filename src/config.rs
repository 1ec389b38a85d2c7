//! Record configuration.
//!
//! Defines `MotorConfig`, the one-shot construction parameters for a motor
//! record: starting position, resolution, velocity, display precision and
//! optional soft limits. The struct is `serde`-deserializable so hosting
//! applications can load axes from TOML, with a separate `validate()` pass
//! for semantic checks that parsing alone cannot catch.

use serde::{Deserialize, Serialize};

use crate::error::{MotorError, MotorResult};
use crate::limits::SoftLimits;

fn default_resolution() -> f64 {
    1.0
}

fn default_velocity() -> f64 {
    10.0
}

fn default_precision() -> u32 {
    3
}

/// Construction parameters for one motor axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorConfig {
    /// Record name, used as a prefix in log events (e.g. "m1").
    pub name: String,
    /// Starting position in user units.
    #[serde(default)]
    pub start_position: f64,
    /// MRES: steps per user unit. Must be nonzero.
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// VELO: move velocity in steps/s. Must be positive.
    #[serde(default = "default_velocity")]
    pub velocity: f64,
    /// PREC: display precision (decimal places).
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// LLM: low soft limit in user units, disabled when absent.
    #[serde(default)]
    pub low_limit: Option<f64>,
    /// HLM: high soft limit in user units, disabled when absent.
    #[serde(default)]
    pub high_limit: Option<f64>,
}

impl MotorConfig {
    /// Create a config with defaults (position 0, resolution 1, velocity 10).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_position: 0.0,
            resolution: default_resolution(),
            velocity: default_velocity(),
            precision: default_precision(),
            low_limit: None,
            high_limit: None,
        }
    }

    /// Set the starting position (user units).
    pub fn with_start_position(mut self, position: f64) -> Self {
        self.start_position = position;
        self
    }

    /// Set the resolution (steps per user unit).
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the velocity (steps/s).
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the display precision.
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Set the soft limits (user units).
    pub fn with_limits(mut self, low: f64, high: f64) -> Self {
        self.low_limit = Some(low);
        self.high_limit = Some(high);
        self
    }

    /// The configured soft limit pair.
    pub fn soft_limits(&self) -> SoftLimits {
        SoftLimits {
            low: self.low_limit,
            high: self.high_limit,
        }
    }

    /// Semantic validation beyond what deserialization enforces.
    pub fn validate(&self) -> MotorResult<()> {
        for value in [self.start_position, self.resolution, self.velocity]
            .into_iter()
            .chain(self.low_limit)
            .chain(self.high_limit)
        {
            if !value.is_finite() {
                return Err(MotorError::NonFiniteValue(value));
            }
        }
        if self.resolution == 0.0 {
            return Err(MotorError::InvalidResolution);
        }
        if self.velocity <= 0.0 {
            return Err(MotorError::InvalidVelocity(self.velocity));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MotorConfig::new("m1");
        assert_eq!(config.resolution, 1.0);
        assert_eq!(config.velocity, 10.0);
        assert_eq!(config.precision, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let config = MotorConfig::new("m1").with_resolution(0.0);
        assert_eq!(config.validate(), Err(MotorError::InvalidResolution));

        let config = MotorConfig::new("m1").with_velocity(-1.0);
        assert_eq!(config.validate(), Err(MotorError::InvalidVelocity(-1.0)));

        let config = MotorConfig::new("m1").with_start_position(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(MotorError::NonFiniteValue(_))
        ));

        let mut config = MotorConfig::new("m1");
        config.high_limit = Some(f64::INFINITY);
        assert!(matches!(
            config.validate(),
            Err(MotorError::NonFiniteValue(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_src = r#"
            name = "m1"
            start_position = 2.5
            resolution = 2.0
            velocity = 5.0
            low_limit = -10.0
            high_limit = 10.0
        "#;
        let config: MotorConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.start_position, 2.5);
        assert_eq!(config.precision, 3); // defaulted
        assert_eq!(
            config.soft_limits(),
            SoftLimits {
                low: Some(-10.0),
                high: Some(10.0)
            }
        );
    }
}
