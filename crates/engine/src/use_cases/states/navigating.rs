use std::time::Duration;

use abyssrun_domain::{GameState, NavigationTarget, VisionSnapshot};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};
use crate::infrastructure::ports::keys;

const WAYPOINT_TIMEOUT: Duration = Duration::from_secs(60);

/// Walks to the most attractive way-point and uses it.
pub struct NavigatingHandler;

#[async_trait]
impl StateHandler for NavigatingHandler {
    fn state(&self) -> GameState {
        GameState::Navigating
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        _snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let Some(telemetry) = ctx.telemetry_snapshot() else {
            return ctx.pause(Duration::from_millis(500), cancel).await;
        };
        let radius = ctx.settings.battle.monster_detection_range;
        let Some((waypoint, kind, distance)) = telemetry.preferred_waypoint(radius) else {
            tracing::debug!("No way-point in range");
            return Ok(());
        };

        tracing::info!(%kind, id = %waypoint.id, distance, "Heading to way-point");
        let target = NavigationTarget::interact_at(waypoint.position, WAYPOINT_TIMEOUT);
        let arrived = ctx.navigate(&target, cancel).await;
        if cancel.is_cancelled() {
            return Err(HandlerError::Interrupted);
        }
        tracing::info!(%kind, arrived, "Way-point attempt finished");
        Ok(())
    }

    fn cleanup(&mut self, ctx: &StateContext) {
        ctx.input.key_up(keys::FORWARD);
        ctx.input.key_up(keys::SPRINT);
    }
}
