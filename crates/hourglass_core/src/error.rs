use thiserror::Error;

/// Invalid parameters rejected before any computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{name} must be finite")]
    NotFinite { name: &'static str },
}

impl ConfigError {
    /// Check that a count-like parameter is non-zero.
    pub fn require_count(name: &'static str, value: usize) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::NotPositive { name, value: 0.0 });
        }
        Ok(())
    }

    /// Check that a scalar parameter is finite and strictly positive.
    pub fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NotFinite { name });
        }
        if value <= 0.0 {
            return Err(ConfigError::NotPositive {
                name,
                value: value as f64,
            });
        }
        Ok(())
    }

    /// Check that a scalar parameter is finite and inside `[min, max]`.
    pub fn require_range(
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    ) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NotFinite { name });
        }
        if value < min || value > max {
            return Err(ConfigError::OutOfRange {
                name,
                value: value as f64,
                min: min as f64,
                max: max as f64,
            });
        }
        Ok(())
    }
}
