//! Unified error types for the domain layer
//!
//! Domain values are mostly infallible; the errors here cover parsing names
//! coming from configuration and validating settings before the engine
//! starts using them.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., a negative distance band)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Parse error (for enums read from configuration)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for settings that break an invariant.
    ///
    /// # Example
    /// ```ignore
    /// if movement.interact_distance <= 0.0 {
    ///     return Err(DomainError::validation("interact_distance must be positive"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
