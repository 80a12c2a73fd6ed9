//! Navigation engine.
//!
//! Drives the character toward a world position by aligning the camera and
//! holding movement keys. Movement is banded by remaining distance:
//!
//! - beyond `sprint_distance`: forward + sprint, traversal key on start
//! - beyond `approach_distance`: walk
//! - beyond `interact_distance`: walk, hopping each scan
//! - within `interact_distance`: arrived
//!
//! Stalls are handled with a recovery jump; hopeless attempts are abandoned.
//! Every key or button held during an attempt is released when it ends.

mod camera;
mod held_inputs;

pub use held_inputs::HeldInputs;

use std::sync::Arc;
use std::time::Duration;

use abyssrun_domain::{MovementSettings, NavigationTarget, Vector3};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::ports::{keys, MouseButton, TelemetryPort, WindowPort};
use crate::use_cases::input::InputDriver;
use crate::use_cases::wait::sleep_or_cancel;

/// The attempt was cancelled from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

type Step = Result<(), Cancelled>;

/// How a navigation attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Arrived,
    Cancelled,
    TimedOut,
    /// Still too far away at the stall checkpoint
    Stalled,
    /// The distance jumped up repeatedly, the character was respawned
    PositionReset,
    TooFar,
    NoTelemetry,
}

impl NavigationOutcome {
    pub fn is_success(self) -> bool {
        self == NavigationOutcome::Arrived
    }
}

#[derive(Clone)]
pub struct Navigator {
    telemetry: Arc<dyn TelemetryPort>,
    input: InputDriver,
    window: Arc<dyn WindowPort>,
    settings: MovementSettings,
}

/// Mutable bookkeeping for one attempt.
struct Progress {
    initial_distance: f64,
    last_distance: f64,
    started: Instant,
    last_scan: Option<Instant>,
    last_position: Vector3,
    last_position_check: Instant,
    last_realign: Instant,
    last_height_jump: Option<Instant>,
    resets: u32,
    interact_presses: u32,
    /// Sprinting with forward and sprint held
    sprinting: bool,
}

impl Navigator {
    pub fn new(
        telemetry: Arc<dyn TelemetryPort>,
        input: InputDriver,
        window: Arc<dyn WindowPort>,
        settings: MovementSettings,
    ) -> Self {
        Self {
            telemetry,
            input,
            window,
            settings,
        }
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    /// Navigate to `target`. `true` only when the target was reached.
    pub async fn navigate_to(&self, target: &NavigationTarget, cancel: &CancellationToken) -> bool {
        let outcome = self.navigate(target, cancel).await;
        if outcome.is_success() {
            tracing::info!(target = %target.position, "Navigation finished");
        } else {
            tracing::warn!(target = %target.position, ?outcome, "Navigation failed");
        }
        outcome.is_success()
    }

    /// Like [`Navigator::navigate_to`], reporting why the attempt ended.
    pub async fn navigate(
        &self,
        target: &NavigationTarget,
        cancel: &CancellationToken,
    ) -> NavigationOutcome {
        let Some(start) = self.player_position() else {
            return NavigationOutcome::NoTelemetry;
        };
        let distance = start.distance(&target.position);
        tracing::info!(
            distance,
            needs_interaction = target.needs_interaction,
            timeout_secs = target.timeout.as_secs_f64(),
            "Navigating to target"
        );

        if target.needs_interaction && distance < self.settings.interact_distance {
            self.input.press(keys::INTERACT);
            return NavigationOutcome::Arrived;
        }
        if !target.needs_interaction && distance < self.settings.arrival_distance {
            return NavigationOutcome::Arrived;
        }

        let mut held = HeldInputs::new(self.input.clone());
        let outcome = match self.drive(target, start, distance, &mut held, cancel).await {
            Ok(outcome) => outcome,
            Err(Cancelled) => NavigationOutcome::Cancelled,
        };
        held.release_all();
        outcome
    }

    async fn drive(
        &self,
        target: &NavigationTarget,
        start: Vector3,
        initial_distance: f64,
        held: &mut HeldInputs,
        cancel: &CancellationToken,
    ) -> Result<NavigationOutcome, Cancelled> {
        let m = &self.settings;
        self.align_camera(&target.position, cancel).await;
        self.pause(Duration::from_secs(1), cancel).await?;

        let now = Instant::now();
        let mut progress = Progress {
            initial_distance,
            last_distance: initial_distance,
            started: now,
            last_scan: None,
            last_position: start,
            last_position_check: now,
            last_realign: now,
            last_height_jump: None,
            resets: 0,
            interact_presses: 0,
            sprinting: false,
        };

        loop {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }
            let elapsed = progress.started.elapsed();
            if elapsed > target.timeout {
                return Ok(NavigationOutcome::TimedOut);
            }

            if elapsed > Duration::from_secs(m.stall_checkpoint_secs) {
                if let Some(position) = self.player_position() {
                    let distance = position.distance(&target.position);
                    if distance > progress.initial_distance * m.stall_ratio {
                        tracing::warn!(
                            distance,
                            initial = progress.initial_distance,
                            "No meaningful progress, abandoning"
                        );
                        return Ok(NavigationOutcome::Stalled);
                    }
                }
            }

            let scan_due = progress
                .last_scan
                .map_or(true, |at| at.elapsed() >= Duration::from_millis(m.scan_interval_ms));
            if scan_due {
                if let Some(outcome) = self.scan(target, &mut progress, held, cancel).await? {
                    return Ok(outcome);
                }
                progress.last_scan = Some(Instant::now());
            }

            if progress.last_position_check.elapsed() >= Duration::from_millis(m.stuck_check_interval_ms) {
                if let Some(position) = self.player_position() {
                    let moved = position.distance(&progress.last_position);
                    if moved < m.stuck_displacement {
                        tracing::info!(moved, "Character appears stuck, jumping");
                        self.double_jump(&target.position, held, cancel).await?;
                        self.pause(Duration::from_millis(500), cancel).await?;
                        self.align_camera(&target.position, cancel).await;
                    }
                    progress.last_position = position;
                }
                progress.last_position_check = Instant::now();
            }

            if progress.last_realign.elapsed() >= Duration::from_millis(m.realign_interval_ms) {
                if progress.sprinting {
                    self.stop_moving(held);
                    progress.sprinting = false;
                }
                self.align_camera(&target.position, cancel).await;
                self.pause(Duration::from_millis(200), cancel).await?;
                progress.last_realign = Instant::now();
            }

            self.pause(Duration::from_millis(m.tick_ms), cancel).await?;
        }
    }

    /// One distance reading and the movement it calls for. `Some` ends the
    /// attempt.
    async fn scan(
        &self,
        target: &NavigationTarget,
        progress: &mut Progress,
        held: &mut HeldInputs,
        cancel: &CancellationToken,
    ) -> Result<Option<NavigationOutcome>, Cancelled> {
        let m = &self.settings;
        let Some(position) = self.player_position() else {
            return Ok(None);
        };
        let distance = position.distance(&target.position);

        if distance > m.abandon_distance {
            tracing::warn!(distance, "Target out of range, abandoning");
            return Ok(Some(NavigationOutcome::TooFar));
        }

        if distance > progress.last_distance + m.position_reset_jump {
            progress.resets += 1;
            tracing::warn!(
                distance,
                last = progress.last_distance,
                resets = progress.resets,
                "Distance jumped, position may have been reset"
            );
            if progress.resets >= m.position_reset_limit {
                return Ok(Some(NavigationOutcome::PositionReset));
            }
        }

        if distance <= m.interact_distance {
            held.release_key(keys::FORWARD);
            held.release_key(keys::SPRINT);
            progress.sprinting = false;
            if !target.needs_interaction {
                return Ok(Some(NavigationOutcome::Arrived));
            }
            progress.interact_presses += 1;
            self.input.press(keys::INTERACT);
            self.pause(Duration::from_millis(300), cancel).await?;
            if progress.interact_presses > m.max_interact_presses {
                return Ok(Some(NavigationOutcome::Arrived));
            }
            return Ok(None);
        }

        if distance > m.sprint_distance {
            self.climb_if_needed(target, position, progress, held, cancel).await?;
            if !progress.sprinting {
                self.align_camera(&target.position, cancel).await;
                self.input.press(keys::TRAVERSAL);
                self.pause(Duration::from_millis(300), cancel).await?;
                held.hold_key(keys::FORWARD);
                self.pause(Duration::from_millis(300), cancel).await?;
                held.hold_key(keys::SPRINT);
                progress.sprinting = true;
            }
        } else if distance > m.approach_distance {
            self.climb_if_needed(target, position, progress, held, cancel).await?;
            if progress.sprinting {
                self.align_camera(&target.position, cancel).await;
                held.release_key(keys::SPRINT);
                held.release_key(keys::FORWARD);
                progress.sprinting = false;
            }
            held.hold_key(keys::FORWARD);
        } else {
            self.input.press(keys::JUMP);
            self.climb_if_needed(target, position, progress, held, cancel).await?;
            if progress.sprinting {
                self.align_camera(&target.position, cancel).await;
                self.stop_moving(held);
                progress.sprinting = false;
            }
            held.hold_key(keys::FORWARD);
        }

        if (distance - progress.last_distance).abs() > m.realign_distance_change {
            self.align_camera(&target.position, cancel).await;
            progress.last_distance = distance;
        }
        Ok(None)
    }

    /// Jump when the target sits noticeably above the player.
    async fn climb_if_needed(
        &self,
        target: &NavigationTarget,
        position: Vector3,
        progress: &mut Progress,
        held: &mut HeldInputs,
        cancel: &CancellationToken,
    ) -> Step {
        let m = &self.settings;
        let cooled_down = progress
            .last_height_jump
            .map_or(true, |at| at.elapsed() > Duration::from_millis(m.height_cooldown_ms));
        let rise = target.position.z - position.z;
        if cooled_down && rise > m.height_threshold {
            tracing::debug!(rise, "Target above player, jumping");
            self.double_jump(&target.position, held, cancel).await?;
            progress.last_height_jump = Some(Instant::now());
            progress.sprinting = false;
        }
        Ok(())
    }

    /// Look up, use the traversal ability, re-align, jump twice, then resume
    /// forward + sprint.
    pub(crate) async fn double_jump(
        &self,
        target: &Vector3,
        held: &mut HeldInputs,
        cancel: &CancellationToken,
    ) -> Step {
        self.input.relative_move(0, -500);
        self.pause(Duration::from_millis(100), cancel).await?;
        self.input.press(keys::TRAVERSAL);
        self.pause(Duration::from_millis(500), cancel).await?;
        self.align_camera(target, cancel).await;

        held.hold_button(MouseButton::Right, self.client_center());
        self.input.press(keys::JUMP);
        self.pause(Duration::from_millis(300), cancel).await?;
        self.input.press(keys::JUMP);
        held.hold_key(keys::FORWARD);
        self.pause(Duration::from_millis(300), cancel).await?;
        held.hold_key(keys::SPRINT);
        Ok(())
    }

    fn stop_moving(&self, held: &mut HeldInputs) {
        held.release_key(keys::FORWARD);
        held.release_key(keys::SPRINT);
        held.release_button(MouseButton::Right);
    }

    fn player_position(&self) -> Option<Vector3> {
        match self.telemetry.player_position() {
            Ok(position) => Some(position),
            Err(e) => {
                tracing::debug!(error = %e, "Player position unavailable");
                None
            }
        }
    }

    async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> Step {
        if sleep_or_cancel(duration, cancel).await {
            Ok(())
        } else {
            Err(Cancelled)
        }
    }
}
