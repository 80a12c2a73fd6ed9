use std::time::Duration;

use abyssrun_domain::{rotation_to_target, ScreenPoint, Vector3};
use tokio_util::sync::CancellationToken;

use super::Navigator;
use crate::use_cases::wait::sleep_or_cancel;

/// Convert an angular error to a clamped mouse step.
fn pixel_step(error_deg: f64, sensitivity: f64, max_step: f64) -> i32 {
    let pixels = (error_deg / sensitivity).round();
    pixels.clamp(-max_step, max_step) as i32
}

impl Navigator {
    /// Turn the camera toward `target`.
    ///
    /// Re-centres the cursor, then issues relative mouse moves until both yaw
    /// and pitch errors are under the threshold or the iteration limit is
    /// reached. Returns the number of moves sent.
    pub async fn align_camera(&self, target: &Vector3, cancel: &CancellationToken) -> u32 {
        let m = self.settings();
        self.input.move_cursor(self.client_center());
        if !sleep_or_cancel(Duration::from_millis(50), cancel).await {
            return 0;
        }

        let mut moves = 0;
        for _ in 0..m.align_max_iterations {
            let pose = match self.telemetry.camera_pose() {
                Ok(pose) => pose,
                Err(e) => {
                    tracing::debug!(error = %e, "Camera pose unavailable, stopping alignment");
                    break;
                }
            };
            let desired = rotation_to_target(&pose.location, target);
            let (pitch_error, yaw_error) = pose.rotation.delta_to(&desired);
            if pitch_error.abs() < m.align_threshold_deg && yaw_error.abs() < m.align_threshold_deg {
                break;
            }

            let dx = pixel_step(yaw_error, m.mouse_sensitivity, m.max_mouse_step);
            // Positive pitch looks up; screen y grows downward.
            let dy = pixel_step(-pitch_error, m.mouse_sensitivity, m.max_mouse_step);
            if dx == 0 && dy == 0 {
                break;
            }
            self.input.relative_move(dx, dy);
            moves += 1;

            if !sleep_or_cancel(Duration::from_millis(m.scan_interval_ms), cancel).await {
                break;
            }
        }

        tracing::trace!(moves, "Camera aligned");
        moves
    }

    pub(crate) fn client_center(&self) -> ScreenPoint {
        self.window
            .client_size()
            .unwrap_or_default()
            .center()
    }
}
