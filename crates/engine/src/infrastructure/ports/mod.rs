//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Screen capture and text recognition (could swap OCR backends)
//! - Game telemetry (live process reads vs. recorded cassettes)
//! - Input injection and window geometry (OS-specific)

mod error;
mod external;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{ActuatorError, CaptureError, TelemetryError, VisionError, WindowError};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    keys, ActuatorPort, CapturedFrame, MouseButton, ScreenCapturePort, TelemetryPort,
    VisionPort, WindowPort,
};

#[cfg(test)]
pub use external::{
    MockActuatorPort, MockScreenCapturePort, MockTelemetryPort, MockVisionPort, MockWindowPort,
};
