use std::sync::Arc;
use std::time::Duration;

use abyssrun_domain::{BotSettings, ClientSize, NavigationTarget, TelemetrySnapshot, Vector3};
use tokio_util::sync::CancellationToken;

use super::HandlerError;
use crate::infrastructure::ports::{TelemetryPort, WindowPort};
use crate::use_cases::input::InputDriver;
use crate::use_cases::navigation::Navigator;
use crate::use_cases::wait::{sleep_or_cancel, Waiter};

/// Collaborators shared by every state handler.
#[derive(Clone)]
pub struct StateContext {
    pub input: InputDriver,
    pub waiter: Waiter,
    pub navigator: Navigator,
    pub telemetry: Arc<dyn TelemetryPort>,
    pub window: Arc<dyn WindowPort>,
    pub settings: Arc<BotSettings>,
}

impl StateContext {
    pub fn client_size(&self) -> ClientSize {
        self.window.client_size().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Client size unavailable, assuming default");
            ClientSize::default()
        })
    }

    /// Current telemetry, or `None` when it cannot be read this tick.
    pub fn telemetry_snapshot(&self) -> Option<TelemetrySnapshot> {
        match self.telemetry.snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::debug!(error = %e, "Telemetry unavailable");
                None
            }
        }
    }

    /// Plain cancellable sleep.
    pub async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Result<(), HandlerError> {
        if sleep_or_cancel(duration, cancel).await {
            Ok(())
        } else {
            Err(HandlerError::Interrupted)
        }
    }

    /// Wait after an action, ending early when the screen shows a new state.
    pub async fn settle(&self, max: Duration, cancel: &CancellationToken) -> Result<(), HandlerError> {
        let changed = self.waiter.interruptible_delay(max, true, cancel).await;
        if changed.is_some() || cancel.is_cancelled() {
            Err(HandlerError::Interrupted)
        } else {
            Ok(())
        }
    }

    pub async fn navigate(&self, target: &NavigationTarget, cancel: &CancellationToken) -> bool {
        self.navigator.navigate_to(target, cancel).await
    }

    pub async fn align_camera(&self, target: &Vector3, cancel: &CancellationToken) {
        self.navigator.align_camera(target, cancel).await;
    }
}
