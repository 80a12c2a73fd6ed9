//! Error types for port operations.
//!
//! Every port failure is transient from the engine's point of view: callers
//! log it and treat the tick as "no signal". Only `initialize()` turns them
//! into a fatal error.

#[derive(Debug, Clone, thiserror::Error)]
pub enum VisionError {
    #[error("Vision engine unavailable: {0}")]
    Unavailable(String),
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),
}

impl VisionError {
    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }

    pub fn recognition(message: impl ToString) -> Self {
        Self::RecognitionFailed(message.to_string())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("Target window not found")]
    WindowNotFound,
    #[error("Capture failed: {0}")]
    Failed(String),
}

impl CaptureError {
    pub fn failed(message: impl ToString) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Telemetry read errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TelemetryError {
    /// The game process is not attached or is between levels.
    #[error("Telemetry unavailable: {0}")]
    Unavailable(String),

    /// A read returned data that could not be decoded.
    #[error("Telemetry read failed in {operation}: {message}")]
    Read {
        operation: &'static str,
        message: String,
    },
}

impl TelemetryError {
    pub fn unavailable(message: impl ToString) -> Self {
        Self::Unavailable(message.to_string())
    }

    pub fn read(operation: &'static str, message: impl ToString) -> Self {
        Self::Read {
            operation,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ActuatorError {
    #[error("Unknown key name: {0}")]
    UnknownKey(String),
    #[error("Input injection failed in {action}: {message}")]
    Injection {
        action: &'static str,
        message: String,
    },
}

impl ActuatorError {
    pub fn unknown_key(key: impl ToString) -> Self {
        Self::UnknownKey(key.to_string())
    }

    pub fn injection(action: &'static str, message: impl ToString) -> Self {
        Self::Injection {
            action,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum WindowError {
    #[error("Target window not found: {0}")]
    NotFound(String),
    #[error("Window query failed: {0}")]
    Query(String),
}

impl WindowError {
    pub fn not_found(title: impl ToString) -> Self {
        Self::NotFound(title.to_string())
    }

    pub fn query(message: impl ToString) -> Self {
        Self::Query(message.to_string())
    }
}
