//! Control loop.
//!
//! Each iteration runs the current state's handler under a fresh child
//! token. A subscription on the snapshot bus cancels that token as soon as
//! the decider picks a different state, so long-running handlers (navigation,
//! waits) are cut short the moment the screen changes. When the handler
//! finishes on its own, the decider runs once more on the freshest snapshot.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use abyssrun_domain::GameState;
use futures_util::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::snapshot_bus::SnapshotBus;
use crate::use_cases::current_state::CurrentState;
use crate::use_cases::decider::DecisionProbe;
use crate::use_cases::panic_message;
use crate::use_cases::states::{HandlerError, HandlerRegistry, StateContext};
use crate::use_cases::wait::sleep_or_cancel;

const PACING: Duration = Duration::from_millis(100);
const ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Requests that reach the loop from other threads.
#[derive(Clone, Default)]
pub struct LoopControl {
    force_exit: Arc<AtomicBool>,
    iteration: Arc<Mutex<Option<CancellationToken>>>,
}

impl LoopControl {
    /// Abandon the current run. Cancels the running iteration; the loop
    /// switches to ForceExiting at the start of its next one.
    pub fn request_force_exit(&self) {
        self.force_exit.store(true, Ordering::Release);
        if let Some(token) = self.lock_iteration().as_ref() {
            token.cancel();
        }
    }

    fn take_force_exit(&self) -> bool {
        self.force_exit.swap(false, Ordering::AcqRel)
    }

    fn set_iteration(&self, token: Option<CancellationToken>) {
        *self.lock_iteration() = token;
    }

    fn lock_iteration(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.iteration.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Orchestrator {
    ctx: StateContext,
    bus: SnapshotBus,
    probe: DecisionProbe,
    state: CurrentState,
    registry: HandlerRegistry,
    control: LoopControl,
    state_timeout: Duration,
    state_since: Instant,
}

impl Orchestrator {
    pub fn new(
        ctx: StateContext,
        bus: SnapshotBus,
        probe: DecisionProbe,
        state: CurrentState,
        control: LoopControl,
    ) -> Self {
        let state_timeout = Duration::from_secs(ctx.settings.timeouts.state_timeout_secs);
        Self {
            ctx,
            bus,
            probe,
            state,
            registry: HandlerRegistry::new(),
            control,
            state_timeout,
            state_since: Instant::now(),
        }
    }

    /// Run until `shutdown` fires.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!(state = %self.state.get(), "Control loop started");
        while !shutdown.is_cancelled() {
            let pass = AssertUnwindSafe(self.iterate(&shutdown)).catch_unwind().await;
            if let Err(panic) = pass {
                self.control.set_iteration(None);
                tracing::error!(
                    state = %self.state.get(),
                    panic = %panic_message(panic.as_ref()),
                    "Control loop iteration panicked"
                );
                if !sleep_or_cancel(ERROR_PAUSE, &shutdown).await {
                    break;
                }
            }
            if !sleep_or_cancel(PACING, &shutdown).await {
                break;
            }
        }
        self.registry.reset_all();
        tracing::info!(state = %self.state.get(), "Control loop stopped");
    }

    async fn iterate(&mut self, shutdown: &CancellationToken) {
        self.ctx.input.activate();

        if self.control.take_force_exit() {
            tracing::info!("Force exit requested");
            self.registry.reset_all();
            self.transition_to(GameState::ForceExiting);
        }

        let mut current = self.state.get();
        if current != GameState::ForceExiting && self.state_since.elapsed() > self.state_timeout {
            tracing::warn!(
                state = %current,
                timeout_secs = self.state_timeout.as_secs(),
                "State timed out, forcing exit"
            );
            self.transition_to(GameState::ForceExiting);
            current = GameState::ForceExiting;
        }

        let snapshot = self.bus.latest();
        let iteration = shutdown.child_token();
        self.control.set_iteration(Some(iteration.clone()));
        let detected: Arc<OnceLock<GameState>> = Arc::new(OnceLock::new());

        let subscription = {
            let probe = self.probe.clone();
            let iteration = iteration.clone();
            let detected = Arc::clone(&detected);
            self.bus.subscribe(move |snapshot| {
                if detected.get().is_some() {
                    return;
                }
                if let Some(next) = probe.evaluate(current, snapshot) {
                    if next != current && detected.set(next).is_ok() {
                        iteration.cancel();
                    }
                }
            })
        };

        let (result, panicked) = match self.registry.get_or_create(current, &self.ctx) {
            Ok(handler) => {
                let pass = AssertUnwindSafe(handler.execute(&self.ctx, snapshot.as_deref(), &iteration))
                    .catch_unwind()
                    .await;
                let panicked = pass.is_err();
                if panicked || iteration.is_cancelled() {
                    handler.cleanup(&self.ctx);
                }
                let result = pass.unwrap_or_else(|panic| {
                    Err(HandlerError::failed(
                        current,
                        format!("panicked: {}", panic_message(panic.as_ref())),
                    ))
                });
                (result, panicked)
            }
            Err(e) => (Err(e), false),
        };
        if panicked {
            self.registry.reset(current);
        }

        drop(subscription);
        self.control.set_iteration(None);

        if iteration.is_cancelled() {
            if shutdown.is_cancelled() {
                return;
            }
            if let Some(next) = detected.get().copied() {
                tracing::debug!(from = %current, to = %next, "Handler interrupted by state change");
                self.transition_to(next);
            }
            return;
        }

        match result {
            Ok(()) => {}
            Err(e) if e.is_interrupted() => {
                tracing::debug!(state = %current, "Handler stopped early");
            }
            Err(e) => {
                tracing::error!(state = %current, error = %e, "State handler failed");
                if !sleep_or_cancel(ERROR_PAUSE, shutdown).await {
                    return;
                }
            }
        }

        if let Some(latest) = self.bus.latest() {
            if let Some(next) = self.probe.evaluate(current, &latest) {
                self.transition_to(next);
            }
        }
    }

    /// The only place the current state changes.
    fn transition_to(&mut self, next: GameState) {
        let previous = self.state.get();
        if previous == next {
            return;
        }
        self.state.replace(next);
        self.state_since = Instant::now();
        self.registry.reset(previous);
        tracing::info!(from = %previous, to = %next, "State transition");
    }
}
