//! Filter error types.

use std::any::Any;
use thiserror::Error;

/// Failures raised by the filter pipeline itself.
#[derive(Debug, Clone, Error)]
pub enum FilterError {
    /// An async filter body panicked.
    #[error("filter '{filter}' panicked: {message}")]
    Panicked {
        /// Name of the filter.
        filter: String,
        /// Panic message, if it was a string.
        message: String,
    },
}

impl FilterError {
    /// Builds a [`FilterError::Panicked`] from a caught panic payload.
    pub fn panicked(filter: &str, payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked {
            filter: filter.to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_payloads() {
        let err = FilterError::panicked("auth", &"denied");
        assert_eq!(err.to_string(), "filter 'auth' panicked: denied");

        let err = FilterError::panicked("auth", &String::from("boom"));
        assert!(err.to_string().ends_with("boom"));

        let err = FilterError::panicked("auth", &42_u8);
        assert!(err.to_string().contains("non-string"));
    }
}
