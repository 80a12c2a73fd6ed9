//! Sensing worker: capture, recognise, filter, publish.
//!
//! Runs on a blocking thread because both capture and recognition are
//! synchronous and CPU-bound. The loop paces itself to the configured
//! interval and never lets a failure escape; a failed pass is logged and
//! retried after a short back-off.

use std::sync::Arc;
use std::time::{Duration, Instant};

use abyssrun_domain::VisionSettings;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::ports::{CaptureError, ScreenCapturePort, VisionError, VisionPort};
use crate::infrastructure::snapshot_bus::SnapshotBus;

const IDLE_FLOOR: Duration = Duration::from_millis(50);
const ERROR_BACKOFF: Duration = Duration::from_millis(100);
const SLEEP_SLICE: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum SensingError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Vision(#[from] VisionError),
}

/// Outcome of a single sensing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// A snapshot with this many regions was published.
    Published(usize),
    /// Capture had nothing to offer this tick.
    NoFrame,
}

pub struct SensingWorker {
    capture: Arc<dyn ScreenCapturePort>,
    vision: Arc<dyn VisionPort>,
    bus: SnapshotBus,
    settings: VisionSettings,
}

impl SensingWorker {
    pub fn new(
        capture: Arc<dyn ScreenCapturePort>,
        vision: Arc<dyn VisionPort>,
        bus: SnapshotBus,
        settings: VisionSettings,
    ) -> Self {
        Self {
            capture,
            vision,
            bus,
            settings,
        }
    }

    /// Run one capture and recognition pass.
    pub fn run_pass(&self) -> Result<PassOutcome, SensingError> {
        let Some(frame) = self.capture.capture()? else {
            return Ok(PassOutcome::NoFrame);
        };
        let raw = self.vision.recognize(&frame)?;
        let snapshot = raw.filtered(
            self.settings.confidence_threshold,
            self.settings.min_text_length,
        );

        if self.settings.show_recognition_results {
            for region in &snapshot.regions {
                tracing::debug!(
                    text = %region.text,
                    confidence = region.confidence,
                    center = %region.center,
                    "Recognised text"
                );
            }
        }

        let count = snapshot.regions.len();
        self.bus.publish(snapshot);
        Ok(PassOutcome::Published(count))
    }

    /// Start the worker on the blocking pool. It exits once `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || self.run_loop(&cancel))
    }

    fn run_loop(&self, cancel: &CancellationToken) {
        let interval = Duration::from_millis(self.settings.interval_ms);
        tracing::info!(interval_ms = self.settings.interval_ms, "Starting sensing worker");

        while !cancel.is_cancelled() {
            let started = Instant::now();
            match self.run_pass() {
                Ok(_) => {
                    let elapsed = started.elapsed();
                    if elapsed > interval * 2 {
                        tracing::warn!(
                            elapsed_ms = elapsed.as_millis() as u64,
                            interval_ms = self.settings.interval_ms,
                            "Recognition pass is slower than twice the interval"
                        );
                    }
                    let remaining = interval.saturating_sub(elapsed).max(IDLE_FLOOR);
                    sleep_unless_cancelled(remaining, cancel);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Sensing pass failed");
                    sleep_unless_cancelled(ERROR_BACKOFF, cancel);
                }
            }
        }

        tracing::info!("Sensing worker shutting down");
    }
}

fn sleep_unless_cancelled(duration: Duration, cancel: &CancellationToken) {
    let deadline = Instant::now() + duration;
    while !cancel.is_cancelled() {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{CapturedFrame, MockScreenCapturePort, MockVisionPort};
    use abyssrun_domain::{ScreenPoint, TextRegion, VisionSnapshot};

    fn frame() -> CapturedFrame {
        CapturedFrame::new(4, 4, Arc::from(vec![0u8; 64]), 1)
    }

    fn worker(
        capture: MockScreenCapturePort,
        vision: MockVisionPort,
        bus: SnapshotBus,
    ) -> SensingWorker {
        let settings = VisionSettings {
            interval_ms: 20,
            confidence_threshold: 0.5,
            min_text_length: 1,
            show_recognition_results: true,
        };
        SensingWorker::new(Arc::new(capture), Arc::new(vision), bus, settings)
    }

    #[test]
    fn pass_publishes_filtered_snapshot() {
        let mut capture = MockScreenCapturePort::new();
        capture.expect_capture().returning(|| Ok(Some(frame())));
        let mut vision = MockVisionPort::new();
        vision.expect_recognize().returning(|_| {
            Ok(VisionSnapshot::new(vec![
                TextRegion::new("开始探索", 0.93, ScreenPoint::new(960, 900)),
                TextRegion::new("噪声", 0.1, ScreenPoint::new(10, 10)),
            ]))
        });

        let bus = SnapshotBus::new();
        let outcome = worker(capture, vision, bus.clone()).run_pass().expect("pass");

        assert_eq!(outcome, PassOutcome::Published(1));
        let latest = bus.latest().expect("published");
        assert!(latest.contains("开始探索"));
        assert!(!latest.contains("噪声"));
    }

    #[test]
    fn missing_frame_publishes_nothing() {
        let mut capture = MockScreenCapturePort::new();
        capture.expect_capture().returning(|| Ok(None));
        let mut vision = MockVisionPort::new();
        vision.expect_recognize().never();

        let bus = SnapshotBus::new();
        let outcome = worker(capture, vision, bus.clone()).run_pass().expect("pass");

        assert_eq!(outcome, PassOutcome::NoFrame);
        assert_eq!(bus.publish_count(), 0);
    }

    #[test]
    fn recognition_failure_is_reported() {
        let mut capture = MockScreenCapturePort::new();
        capture.expect_capture().returning(|| Ok(Some(frame())));
        let mut vision = MockVisionPort::new();
        vision
            .expect_recognize()
            .returning(|_| Err(VisionError::recognition("model not loaded")));

        let bus = SnapshotBus::new();
        let err = worker(capture, vision, bus.clone())
            .run_pass()
            .expect_err("vision failed");

        assert!(matches!(err, SensingError::Vision(_)));
        assert!(bus.latest().is_none());
    }

    #[tokio::test]
    async fn worker_stops_when_cancelled() {
        let mut capture = MockScreenCapturePort::new();
        capture.expect_capture().returning(|| Ok(Some(frame())));
        let mut vision = MockVisionPort::new();
        vision
            .expect_recognize()
            .returning(|_| Ok(VisionSnapshot::empty()));

        let bus = SnapshotBus::new();
        let cancel = CancellationToken::new();
        let handle = worker(capture, vision, bus.clone()).spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("worker joined in time")
            .expect("worker did not panic");
        assert!(bus.publish_count() >= 1);
    }
}
