use std::time::Duration;

use abyssrun_domain::{markers, Entity, GameState, NavigationTarget, Vector3, VisionSnapshot};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};
use crate::infrastructure::ports::keys;

const MECHANISM_RADIUS: f64 = 10_000.0;
const WAYPOINT_RADIUS: f64 = 30_000.0;
const MECHANISM_TIMEOUT: Duration = Duration::from_secs(20);

/// Activates bonfire mechanisms. Near a turret, heads for the next
/// way-point instead.
pub struct FireMechanismHandler;

impl FireMechanismHandler {
    fn pick_target(ctx: &StateContext) -> Option<(Vector3, &'static str)> {
        let telemetry = ctx.telemetry_snapshot()?;
        if let Some((mechanism, _)) = telemetry.nearest(MECHANISM_RADIUS, Entity::is_open_fire_mechanism) {
            return Some((mechanism.position, "mechanism"));
        }
        let (turret, _) = telemetry.nearest(MECHANISM_RADIUS, Entity::is_turret)?;
        Some(match telemetry.preferred_waypoint(WAYPOINT_RADIUS) {
            Some((waypoint, _, _)) => (waypoint.position, "way-point"),
            None => (turret.position, "turret"),
        })
    }
}

#[async_trait]
impl StateHandler for FireMechanismHandler {
    fn state(&self) -> GameState {
        GameState::InteractingFireMechanism
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        if let Some(confirm) = snapshot.and_then(|s| s.find(markers::CONFIRM)) {
            ctx.input.click(confirm.center);
            return ctx.settle(Duration::from_millis(500), cancel).await;
        }

        let Some((position, kind)) = Self::pick_target(ctx) else {
            tracing::debug!("No mechanism in range");
            return Ok(());
        };

        tracing::info!(kind, target = %position, "Approaching mechanism");
        let arrived = ctx
            .navigate(&NavigationTarget::interact_at(position, MECHANISM_TIMEOUT), cancel)
            .await;
        if cancel.is_cancelled() {
            return Err(HandlerError::Interrupted);
        }
        tracing::info!(kind, arrived, "Mechanism attempt finished");
        ctx.settle(Duration::from_secs(2), cancel).await
    }

    fn cleanup(&mut self, ctx: &StateContext) {
        ctx.input.key_up(keys::FORWARD);
        ctx.input.key_up(keys::SPRINT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{entity, waypoint, TestRig};
    use abyssrun_domain::{ScreenPoint, TextRegion};

    fn mechanism(x: f64) -> Entity {
        Entity {
            is_actor: false,
            can_open: true,
            ..entity(10, "BP_Mechanism_C", "BP_OpenUIMechanism_Rouge_C", Vector3::new(x, 0.0, 0.0))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_button_wins() {
        let rig = TestRig::new(GameState::InteractingFireMechanism);
        rig.game.set_entities(vec![mechanism(200.0)]);
        let ctx = rig.context();
        let snapshot = VisionSnapshot::new(vec![TextRegion::new(
            "确定",
            0.9,
            ScreenPoint::new(1000, 800),
        )]);

        FireMechanismHandler
            .execute(&ctx, Some(&snapshot), &CancellationToken::new())
            .await
            .expect("mechanism");

        assert_eq!(rig.game.recorder().clicks(), vec![ScreenPoint::new(1000, 800)]);
        assert!(rig.game.recorder().taps().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn nearby_mechanism_is_interacted_with() {
        let rig = TestRig::new(GameState::InteractingFireMechanism);
        rig.game.set_entities(vec![mechanism(200.0)]);
        let ctx = rig.context();

        FireMechanismHandler
            .execute(&ctx, None, &CancellationToken::new())
            .await
            .expect("mechanism");

        assert_eq!(rig.game.recorder().taps(), vec!["F".to_string()]);
    }

    #[test]
    fn opened_mechanism_is_skipped_for_turret_way_point() {
        let rig = TestRig::new(GameState::InteractingFireMechanism);
        let opened = Entity {
            open_state: true,
            ..mechanism(200.0)
        };
        rig.game.set_entities(vec![
            opened,
            entity(11, "BP_Paotai_C", "BP_Paotai_Rouge01_C", Vector3::new(900.0, 0.0, 0.0)),
            waypoint(12, "BP_RougeLikeDelivery_Boss_C", Vector3::new(20000.0, 0.0, 0.0)),
            waypoint(13, "BP_RougeLikeDelivery_Event_C", Vector3::new(25000.0, 0.0, 0.0)),
        ]);

        let picked = FireMechanismHandler::pick_target(&rig.context());
        assert_eq!(picked, Some((Vector3::new(25000.0, 0.0, 0.0), "way-point")));
    }

    #[test]
    fn turret_without_way_point_is_the_target() {
        let rig = TestRig::new(GameState::InteractingFireMechanism);
        rig.game.set_entities(vec![entity(
            11,
            "BP_Paotai_C",
            "BP_Paotai_Rouge01_C",
            Vector3::new(900.0, 0.0, 0.0),
        )]);

        let picked = FireMechanismHandler::pick_target(&rig.context());
        assert_eq!(picked, Some((Vector3::new(900.0, 0.0, 0.0), "turret")));
    }
}
