//! Echo chamber error types.
//!
//! Only configuration problems are errors. Degenerate populations (empty
//! candidate pools, edgeless graphs, isolated agents) resolve to documented
//! defaults inside the model and metrics, and graph invariant violations
//! (self-loops, duplicate edges) are silent no-ops in the graph store.

use thiserror::Error;

/// Echo chamber errors.
#[derive(Error, Debug)]
pub enum EchoChamberError {
    /// A run parameter is outside its documented domain.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in configuration.
        name: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// Unknown activation policy name.
    #[error("Unknown schedule type: {0} (expected Sequential, Random or Simultaneous)")]
    UnknownSchedule(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A concurrent sweep worker did not complete.
    #[error("Sweep worker failed: {0}")]
    Worker(String),
}

/// Result type alias for echo chamber operations
pub type Result<T> = std::result::Result<T, EchoChamberError>;

impl EchoChamberError {
    /// Shorthand for [`EchoChamberError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for EchoChamberError {
    fn from(err: toml::de::Error) -> Self {
        EchoChamberError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for EchoChamberError {
    fn from(err: tokio::task::JoinError) -> Self {
        EchoChamberError::Worker(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = EchoChamberError::invalid("tolerance", "must be within [0, 1], got 1.5");
        assert_eq!(
            err.to_string(),
            "Invalid parameter `tolerance`: must be within [0, 1], got 1.5"
        );
    }

    #[test]
    fn test_toml_error_maps_to_config() {
        let err: EchoChamberError = toml::from_str::<toml::Value>("= broken")
            .unwrap_err()
            .into();
        assert!(matches!(err, EchoChamberError::Config(_)));
    }
}
