//! Error kinds raised by the advisor core
//!
//! Three kinds only. Validation and not-found errors are raised per request;
//! configuration errors happen once, while the training data and rule
//! database are loaded at startup.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdvisorError {
    /// Malformed or missing feature values, empty training set,
    /// single-class model asked for an explanation
    #[error("validation error: {0}")]
    Validation(String),

    /// Plant name absent from the rule store (single-crop lookup only)
    #[error("plant not found: {0}")]
    NotFound(String),

    /// Rule database, training data or config file does not match its schema
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AdvisorError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AdvisorError::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AdvisorError::Configuration(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AdvisorError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AdvisorError::NotFound(_))
    }
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = AdvisorError::NotFound("unicorn-fruit".to_string());
        assert_eq!(e.to_string(), "plant not found: unicorn-fruit");
        assert!(e.is_not_found());
        assert!(!e.is_validation());

        let e = AdvisorError::validation("missing field 'ph'");
        assert!(e.is_validation());
        assert!(e.to_string().contains("ph"));
    }
}
