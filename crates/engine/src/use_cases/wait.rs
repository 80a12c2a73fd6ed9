//! Wait and cancellation primitives.
//!
//! Every wait here is cancellable through the token it is given and never
//! returns an error: cancellation and timeout both come back as a plain
//! `false`/`None`, and callers decide what to do next.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use abyssrun_domain::{GameState, ScreenPoint, TextMatch, VisionSnapshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::snapshot_bus::SnapshotBus;
use crate::use_cases::current_state::CurrentState;
use crate::use_cases::decider::DecisionProbe;
use crate::use_cases::input::InputDriver;

/// Interval between snapshot polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sleep for `duration` unless `cancel` fires first.
///
/// Returns `true` when the full duration elapsed.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[derive(Clone)]
pub struct Waiter {
    bus: SnapshotBus,
    probe: DecisionProbe,
    state: CurrentState,
    input: InputDriver,
}

impl Waiter {
    pub fn new(
        bus: SnapshotBus,
        probe: DecisionProbe,
        state: CurrentState,
        input: InputDriver,
    ) -> Self {
        Self {
            bus,
            probe,
            state,
            input,
        }
    }

    /// Sleep up to `max`, returning early with the detected state as soon as
    /// a published snapshot makes the decider pick a state different from
    /// the one current at call time.
    ///
    /// With `allow_interrupt == false` this is a plain cancellable sleep.
    pub async fn interruptible_delay(
        &self,
        max: Duration,
        allow_interrupt: bool,
        cancel: &CancellationToken,
    ) -> Option<GameState> {
        if !allow_interrupt {
            sleep_or_cancel(max, cancel).await;
            return None;
        }

        let baseline = self.state.get();
        let wake = cancel.child_token();
        let detected: Arc<OnceLock<GameState>> = Arc::new(OnceLock::new());

        let _subscription = {
            let probe = self.probe.clone();
            let wake = wake.clone();
            let detected = Arc::clone(&detected);
            self.bus.subscribe(move |snapshot| {
                if detected.get().is_some() {
                    return;
                }
                if let Some(next) = probe.evaluate(baseline, snapshot) {
                    if next != baseline && detected.set(next).is_ok() {
                        wake.cancel();
                    }
                }
            })
        };

        sleep_or_cancel(max, &wake).await;

        let result = detected.get().copied();
        if let Some(next) = result {
            tracing::debug!(from = %baseline, to = %next, "Delay interrupted by state change");
        }
        result
    }

    /// Wait until `text` is visible. `false` on timeout or cancellation.
    pub async fn wait_for_text(
        &self,
        text: &str,
        timeout: Duration,
        mode: TextMatch,
        cancel: &CancellationToken,
    ) -> bool {
        self.poll_until(timeout, cancel, |snapshot| {
            snapshot.is_some_and(|s| s.find_with(text, mode).is_some())
        })
        .await
    }

    /// Wait until `text` is gone. No snapshot at all counts as gone.
    pub async fn wait_for_text_disappear(
        &self,
        text: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> bool {
        self.poll_until(timeout, cancel, |snapshot| {
            snapshot.map_or(true, |s| !s.contains(text))
        })
        .await
    }

    /// Wait for any of `candidates` to appear and click the first one found,
    /// checking candidates in order.
    pub async fn wait_and_click(
        &self,
        candidates: &[&str],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(snapshot) = self.bus.latest() {
                let hit = candidates
                    .iter()
                    .find_map(|c| snapshot.find(c).map(|r| (*c, r.center)));
                if let Some((text, center)) = hit {
                    tracing::debug!(text, x = center.x, y = center.y, "Found text, clicking");
                    self.input.click(center);
                    return true;
                }
            }
            if !self.pause_before_next_poll(deadline, cancel).await {
                return false;
            }
        }
    }

    /// Click `point`, then wait for `text` to appear.
    pub async fn click_and_wait(
        &self,
        point: ScreenPoint,
        text: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> bool {
        self.input.click(point);
        self.wait_for_text(text, timeout, TextMatch::Contains, cancel)
            .await
    }

    /// Click `point`, then wait for `text` to disappear.
    pub async fn click_and_wait_disappear(
        &self,
        point: ScreenPoint,
        text: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> bool {
        self.input.click(point);
        self.wait_for_text_disappear(text, timeout, cancel).await
    }

    /// Tap `key`, then wait for `text` to appear.
    pub async fn send_key_and_wait(
        &self,
        key: &str,
        text: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> bool {
        self.input.press(key);
        self.wait_for_text(text, timeout, TextMatch::Contains, cancel)
            .await
    }

    async fn poll_until<F>(&self, timeout: Duration, cancel: &CancellationToken, done: F) -> bool
    where
        F: Fn(Option<&VisionSnapshot>) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let latest = self.bus.latest();
            if done(latest.as_deref()) {
                return true;
            }
            if !self.pause_before_next_poll(deadline, cancel).await {
                return false;
            }
        }
    }

    /// Sleep one poll interval, clipped to `deadline`. `false` once the
    /// deadline has passed or `cancel` fired.
    async fn pause_before_next_poll(&self, deadline: Instant, cancel: &CancellationToken) -> bool {
        let now = Instant::now();
        if cancel.is_cancelled() || now >= deadline {
            return false;
        }
        sleep_or_cancel(POLL_INTERVAL.min(deadline - now), cancel).await
    }
}
