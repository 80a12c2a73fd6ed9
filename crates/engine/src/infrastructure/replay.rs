//! Cassette playback adapters for dry runs.
//!
//! A cassette is a JSON recording of what the sensors saw: a sequence of
//! frames, each holding the recognised text regions and (optionally) the
//! telemetry read at the same moment. Playing it back drives the whole
//! engine without a live game, while [`LoggingActuator`] logs the input the
//! engine would have injected.
//!
//! # Cassette format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "client_size": { "width": 1920, "height": 1080 },
//!   "frames": [
//!     { "regions": [{ "text": "坠入深渊", "confidence": 0.98, "center": { "x": 960, "y": 540 } }] }
//!   ]
//! }
//! ```
//!
//! Capture advances one frame per call and holds on the last frame once the
//! recording is exhausted.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use abyssrun_domain::{
    CameraPose, ClientSize, Entity, ScreenPoint, TelemetrySnapshot, TextRegion, Vector3,
    VisionSnapshot,
};
use serde::{Deserialize, Serialize};

use crate::infrastructure::ports::{
    ActuatorError, ActuatorPort, CaptureError, CapturedFrame, MouseButton, ScreenCapturePort,
    TelemetryError, TelemetryPort, VisionError, VisionPort, WindowError, WindowPort,
};

/// Current cassette format version.
const CASSETTE_VERSION: &str = "1.0";

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to read cassette {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse cassette: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Unsupported cassette version {found} (expected {})", CASSETTE_VERSION)]
    Version { found: String },
    #[error("Cassette has no frames")]
    Empty,
}

/// One recorded sensing tick.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RecordedFrame {
    #[serde(default)]
    pub regions: Vec<TextRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetrySnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cassette {
    version: String,
    #[serde(default)]
    client_size: ClientSize,
    frames: Vec<RecordedFrame>,
}

impl Cassette {
    pub fn new(client_size: ClientSize, frames: Vec<RecordedFrame>) -> Self {
        Self {
            version: CASSETTE_VERSION.to_string(),
            client_size,
            frames,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ReplayError> {
        let cassette: Cassette = serde_json::from_str(raw)?;
        if cassette.version != CASSETTE_VERSION {
            return Err(ReplayError::Version {
                found: cassette.version,
            });
        }
        if cassette.frames.is_empty() {
            return Err(ReplayError::Empty);
        }
        Ok(cassette)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Shared playback position across the replay adapters.
#[derive(Clone)]
pub struct ReplaySession {
    cassette: Arc<Cassette>,
    cursor: Arc<AtomicUsize>,
}

impl ReplaySession {
    pub fn new(cassette: Cassette) -> Self {
        Self {
            cassette: Arc::new(cassette),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Index of the most recently captured frame.
    pub fn position(&self) -> usize {
        let last = self.cassette.frames.len().saturating_sub(1);
        self.cursor.load(Ordering::Acquire).saturating_sub(1).min(last)
    }

    fn advance(&self) -> usize {
        let last = self.cassette.frames.len().saturating_sub(1);
        let taken = self.cursor.fetch_add(1, Ordering::AcqRel);
        taken.min(last)
    }

    fn frame(&self, index: usize) -> Option<&RecordedFrame> {
        self.cassette.frames.get(index)
    }

    fn current_telemetry(&self) -> Result<&TelemetrySnapshot, TelemetryError> {
        self.frame(self.position())
            .and_then(|f| f.telemetry.as_ref())
            .ok_or_else(|| TelemetryError::unavailable("no telemetry recorded for this frame"))
    }
}

/// Hands out one cassette frame per call.
pub struct ReplayCapture {
    session: ReplaySession,
}

impl ReplayCapture {
    pub fn new(session: ReplaySession) -> Self {
        Self { session }
    }
}

impl ScreenCapturePort for ReplayCapture {
    fn capture(&self) -> Result<Option<CapturedFrame>, CaptureError> {
        let index = self.session.advance();
        let size = self.session.cassette.client_size;
        Ok(Some(CapturedFrame::new(
            size.width.max(0) as u32,
            size.height.max(0) as u32,
            Arc::from(Vec::new()),
            index as u64,
        )))
    }
}

/// Returns the regions recorded for the captured frame.
pub struct ReplayVision {
    session: ReplaySession,
}

impl ReplayVision {
    pub fn new(session: ReplaySession) -> Self {
        Self { session }
    }
}

impl VisionPort for ReplayVision {
    fn recognize(&self, frame: &CapturedFrame) -> Result<VisionSnapshot, VisionError> {
        let recorded = self
            .session
            .frame(frame.sequence as usize)
            .ok_or_else(|| {
                VisionError::recognition(format!("frame {} not in cassette", frame.sequence))
            })?;
        Ok(VisionSnapshot::new(recorded.regions.clone()))
    }
}

/// Serves the telemetry recorded alongside the latest captured frame.
pub struct ReplayTelemetry {
    session: ReplaySession,
}

impl ReplayTelemetry {
    pub fn new(session: ReplaySession) -> Self {
        Self { session }
    }
}

impl TelemetryPort for ReplayTelemetry {
    fn entities(&self) -> Result<Vec<Entity>, TelemetryError> {
        Ok(self.session.current_telemetry()?.entities.clone())
    }

    fn camera_pose(&self) -> Result<CameraPose, TelemetryError> {
        Ok(self.session.current_telemetry()?.camera)
    }

    fn player_position(&self) -> Result<Vector3, TelemetryError> {
        Ok(self.session.current_telemetry()?.player_position)
    }

    fn snapshot(&self) -> Result<TelemetrySnapshot, TelemetryError> {
        self.session.current_telemetry().cloned()
    }
}

pub struct ReplayWindow {
    size: ClientSize,
}

impl ReplayWindow {
    pub fn new(session: &ReplaySession) -> Self {
        Self {
            size: session.cassette.client_size,
        }
    }
}

impl WindowPort for ReplayWindow {
    fn client_size(&self) -> Result<ClientSize, WindowError> {
        Ok(self.size)
    }
}

/// Actuator that logs every input instead of injecting it.
#[derive(Debug, Default)]
pub struct LoggingActuator;

impl ActuatorPort for LoggingActuator {
    fn send_key(&self, key: &str, hold: Duration) -> Result<(), ActuatorError> {
        tracing::info!(key, hold_ms = hold.as_millis() as u64, "send_key");
        Ok(())
    }

    fn key_down(&self, key: &str) -> Result<(), ActuatorError> {
        tracing::info!(key, "key_down");
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), ActuatorError> {
        tracing::info!(key, "key_up");
        Ok(())
    }

    fn click(&self, point: ScreenPoint) -> Result<(), ActuatorError> {
        tracing::info!(x = point.x, y = point.y, "click");
        Ok(())
    }

    fn mouse_down(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError> {
        tracing::info!(x = point.x, y = point.y, %button, "mouse_down");
        Ok(())
    }

    fn mouse_up(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError> {
        tracing::info!(x = point.x, y = point.y, %button, "mouse_up");
        Ok(())
    }

    fn move_cursor(&self, point: ScreenPoint) -> Result<(), ActuatorError> {
        tracing::debug!(x = point.x, y = point.y, "move_cursor");
        Ok(())
    }

    fn send_relative_mouse_move(&self, dx: i32, dy: i32) -> Result<(), ActuatorError> {
        tracing::debug!(dx, dy, "relative_mouse_move");
        Ok(())
    }

    fn activate(&self) -> Result<(), ActuatorError> {
        Ok(())
    }
}
