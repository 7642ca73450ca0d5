//! Parameter validation errors shared by strategy construction and sizing.
//!
//! Every variant names the offending parameter so callers can report it
//! without re-deriving context.

/// Rejected strategy or sizing input. Raised before any computation runs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown strategy type '{0}'")]
    UnknownStrategy(String),

    #[error("strategy '{strategy}' is missing required parameter '{param}'")]
    MissingParameter { strategy: String, param: String },

    #[error("strategy '{strategy}' does not accept parameter '{param}'")]
    UnexpectedParameter { strategy: String, param: String },

    #[error("strategy '{strategy}': parameter '{param}' {reason}")]
    InvalidParameter {
        strategy: String,
        param: String,
        reason: String,
    },

    #[error("size must be a finite number > 0, got {size}")]
    InvalidSize { size: f64 },

    #[error("unknown size type '{0}' (expected Amount, Value or Percent)")]
    UnknownSizeType(String),

    #[error("'{param}' {reason}")]
    InvalidSetting { param: String, reason: String },
}

impl ValidationError {
    /// Name of the parameter this error is about, if any.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            ValidationError::MissingParameter { param, .. }
            | ValidationError::UnexpectedParameter { param, .. }
            | ValidationError::InvalidParameter { param, .. }
            | ValidationError::InvalidSetting { param, .. } => Some(param),
            ValidationError::InvalidSize { .. } | ValidationError::UnknownSizeType(_) => {
                Some("size")
            }
            ValidationError::UnknownStrategy(_) => Some("type"),
        }
    }
}
