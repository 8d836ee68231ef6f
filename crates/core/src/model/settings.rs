use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlatformSettingsError {
    #[error("fallback satisfaction rate must be between 0 and 100")]
    InvalidFallbackSatisfactionRate,
}

/// Display-level knobs for platform statistics.
///
/// The fallback satisfaction rate is what the stats endpoint reports while
/// the platform has no enrollments at all; it is a presentation default,
/// not a domain invariant, so it stays configurable.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformSettings {
    fallback_satisfaction_rate: f64,
}

impl PlatformSettings {
    /// Creates settings with a custom fallback satisfaction rate.
    ///
    /// # Errors
    ///
    /// Returns `PlatformSettingsError` if the rate is outside 0–100 or not
    /// finite.
    pub fn new(fallback_satisfaction_rate: f64) -> Result<Self, PlatformSettingsError> {
        if !fallback_satisfaction_rate.is_finite()
            || !(0.0..=100.0).contains(&fallback_satisfaction_rate)
        {
            return Err(PlatformSettingsError::InvalidFallbackSatisfactionRate);
        }
        Ok(Self {
            fallback_satisfaction_rate,
        })
    }

    #[must_use]
    pub fn fallback_satisfaction_rate(&self) -> f64 {
        self.fallback_satisfaction_rate
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            fallback_satisfaction_rate: 95.0,
        }
    }
}
