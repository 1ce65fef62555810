use thiserror::Error;

/// Errors raised at the construction boundary of plan, profile and
/// simulation inputs, and while loading policy-year configuration.
#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("Invalid plan parameter `{field}`: {reason}")]
    InvalidPlanParameters { field: &'static str, reason: String },

    #[error("Invalid profile field `{field}`: {reason}")]
    InvalidProfile { field: &'static str, reason: String },

    #[error("Invalid simulation parameters: {reason}")]
    InvalidSimulation { reason: String },

    #[error("No policy-year configuration for plan year {0}")]
    UnknownPlanYear(u16),

    #[error("Configuration decode error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoverageError>;

/// Reject negative or non-finite currency amounts.
pub(crate) fn check_currency(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(CoverageError::InvalidPlanParameters {
            field,
            reason: format!("must be finite, got {value}"),
        });
    }
    if value < 0.0 {
        return Err(CoverageError::InvalidPlanParameters {
            field,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(value)
}

/// Reject fractions outside [0, 1].
pub(crate) fn check_fraction(field: &'static str, value: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CoverageError::InvalidPlanParameters {
            field,
            reason: format!("must lie in [0, 1], got {value}"),
        });
    }
    Ok(value)
}
