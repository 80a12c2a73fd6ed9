//! Combat against the nearest hostile.
//!
//! Each pass picks the nearest targetable hostile. Distant targets are
//! approached in short sprints; a target that stays out of reach for three
//! passes is treated as unreachable and the close button is clicked to shake
//! off whatever is in the way. Targets in reach get lock-on, a camera
//! alignment, one step of the skill rotation and a burst of melee swings.

use std::collections::HashMap;
use std::time::Duration;

use abyssrun_domain::{markers, BattleSettings, Entity, GameState, VisionSnapshot};
use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};
use crate::infrastructure::ports::{keys, MouseButton};
use crate::use_cases::navigation::HeldInputs;

const STUCK_LIMIT: u32 = 3;
const APPROACH_BURST: Duration = Duration::from_secs(2);
const SEARCH_BURST: Duration = Duration::from_secs(3);

pub struct BattleHandler {
    settings: BattleSettings,
    last_skill: Option<Instant>,
    /// 0 casts Q, 1..=e_skill_count cast E
    rotation_step: u32,
    stuck_counts: HashMap<String, u32>,
}

impl BattleHandler {
    pub fn new(settings: BattleSettings) -> Self {
        Self {
            settings,
            last_skill: None,
            rotation_step: 0,
            stuck_counts: HashMap::new(),
        }
    }

    /// Cast the next skill of the rotation if its interval has passed.
    async fn use_skill(&mut self, ctx: &StateContext, cancel: &CancellationToken) -> Result<(), HandlerError> {
        let interval_ms = if self.rotation_step == 0 {
            self.settings.q_skill_interval_ms
        } else {
            self.settings.e_skill_interval_ms
        };
        let ready = self
            .last_skill
            .map_or(true, |at| at.elapsed() > Duration::from_millis(interval_ms));
        if !ready {
            return Ok(());
        }

        if self.rotation_step == 0 {
            ctx.input.press(keys::SKILL_Q);
            self.rotation_step = 1;
        } else {
            ctx.input.press(keys::SKILL_E);
            tracing::debug!(step = self.rotation_step, of = self.settings.e_skill_count, "E skill");
            self.rotation_step += 1;
            if self.rotation_step > self.settings.e_skill_count {
                self.rotation_step = 0;
            }
        }
        self.last_skill = Some(Instant::now());
        ctx.pause(Duration::from_millis(100), cancel).await
    }

    async fn swing(&self, ctx: &StateContext, cancel: &CancellationToken) -> Result<(), HandlerError> {
        let at = ctx.client_size().center();
        let mut held = HeldInputs::new(ctx.input.clone());
        for _ in 0..self.settings.attack_count {
            held.hold_button(MouseButton::Right, at);
            ctx.pause(Duration::from_millis(self.settings.attack_interval_ms), cancel)
                .await?;
            held.release_button(MouseButton::Right);
            ctx.pause(Duration::from_millis(self.settings.attack_recovery_ms), cancel)
                .await?;
        }
        Ok(())
    }

    async fn sprint_for(
        &self,
        ctx: &StateContext,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let mut held = HeldInputs::new(ctx.input.clone());
        held.hold_key(keys::FORWARD);
        held.hold_key(keys::SPRINT);
        ctx.pause(duration, cancel).await?;
        held.release_all();
        Ok(())
    }
}

#[async_trait]
impl StateHandler for BattleHandler {
    fn state(&self) -> GameState {
        GameState::InBattle
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        if snapshot.is_some_and(|s| s.contains_any(&[markers::DIVE_INTO_ABYSS, markers::EXPLORE_DETAILS])) {
            tracing::debug!("Left the battlefield");
            return Ok(());
        }
        let Some(telemetry) = ctx.telemetry_snapshot() else {
            return ctx.pause(Duration::from_millis(500), cancel).await;
        };

        let Some((target, distance)) = telemetry
            .nearest(self.settings.monster_detection_range, Entity::is_targetable_hostile)
            .map(|(e, d)| (e.clone(), d))
        else {
            tracing::info!("Battle without visible hostiles, moving forward");
            self.sprint_for(ctx, SEARCH_BURST, cancel).await?;
            return ctx.pause(Duration::from_millis(500), cancel).await;
        };

        let key = target.target_key();
        if distance > self.settings.approach_distance {
            let attempts = self.stuck_counts.entry(key).or_insert(0);
            *attempts += 1;
            if *attempts >= STUCK_LIMIT {
                tracing::warn!(target = %target.name, distance, "Target unreachable, clicking close");
                ctx.input.click(ctx.client_size().close_button());
                return Ok(());
            }
            tracing::debug!(target = %target.name, distance, attempt = *attempts, "Approaching target");
            ctx.align_camera(&target.position, cancel).await;
            return self.sprint_for(ctx, APPROACH_BURST, cancel).await;
        }

        if let Some(attempts) = self.stuck_counts.get_mut(&key) {
            *attempts = 0;
        }

        ctx.input.press(keys::LOCK_ON);
        ctx.pause(Duration::from_millis(50), cancel).await?;
        ctx.input.press(keys::INTERACT);
        ctx.pause(Duration::from_millis(50), cancel).await?;
        ctx.align_camera(&target.position, cancel).await;

        self.use_skill(ctx, cancel).await?;
        self.swing(ctx, cancel).await
    }

    fn cleanup(&mut self, ctx: &StateContext) {
        ctx.input.key_up(keys::FORWARD);
        ctx.input.key_up(keys::SPRINT);
        ctx.input.mouse_up(ctx.client_size().center(), MouseButton::Right);
    }

    fn reset(&mut self) {
        self.last_skill = None;
        self.rotation_step = 0;
        self.stuck_counts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{monster, TestRig};
    use abyssrun_domain::{ScreenPoint, Vector3};

    fn handler() -> BattleHandler {
        BattleHandler::new(BattleSettings::default())
    }

    fn skills(rig: &TestRig) -> Vec<String> {
        rig.game
            .recorder()
            .taps()
            .into_iter()
            .filter(|k| k == "Q" || k == "E")
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn skill_rotation_is_q_then_e_four_times() {
        let rig = TestRig::new(GameState::InBattle);
        rig.game.set_entities(vec![monster(1, "Wraith", Vector3::new(800.0, 0.0, 0.0))]);
        let ctx = rig.context();
        let mut battle = handler();
        let cancel = CancellationToken::new();

        for _ in 0..6 {
            battle.execute(&ctx, None, &cancel).await.expect("battle");
        }

        assert_eq!(skills(&rig), vec!["Q", "E", "E", "E", "E", "Q"]);
    }

    #[tokio::test(start_paused = true)]
    async fn skills_wait_for_their_interval() {
        let rig = TestRig::new(GameState::InBattle);
        rig.game.set_entities(vec![monster(1, "Wraith", Vector3::new(800.0, 0.0, 0.0))]);
        let ctx = rig.context();
        let mut battle = BattleHandler::new(BattleSettings {
            e_skill_interval_ms: 10_000,
            ..BattleSettings::default()
        });
        let cancel = CancellationToken::new();

        for _ in 0..3 {
            battle.execute(&ctx, None, &cancel).await.expect("battle");
        }

        assert_eq!(skills(&rig), vec!["Q"]);
    }

    #[tokio::test(start_paused = true)]
    async fn attack_pass_locks_on_and_swings() {
        let rig = TestRig::new(GameState::InBattle);
        rig.game.set_entities(vec![monster(1, "Wraith", Vector3::new(800.0, 0.0, 0.0))]);
        let ctx = rig.context();

        handler()
            .execute(&ctx, None, &CancellationToken::new())
            .await
            .expect("battle");

        let recorder = rig.game.recorder();
        assert_eq!(recorder.taps()[..2], ["Z".to_string(), "F".to_string()]);
        assert_eq!(recorder.button_down_count(MouseButton::Right), 3);
        assert!(recorder.inputs_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_target_triggers_close_click_on_third_pass() {
        let rig = TestRig::new(GameState::InBattle);
        rig.game.freeze();
        rig.game.set_entities(vec![monster(1, "Wraith", Vector3::new(8000.0, 0.0, 0.0))]);
        let ctx = rig.context();
        let mut battle = handler();
        let cancel = CancellationToken::new();

        battle.execute(&ctx, None, &cancel).await.expect("battle");
        battle.execute(&ctx, None, &cancel).await.expect("battle");
        assert!(rig.game.recorder().clicks().is_empty());

        battle.execute(&ctx, None, &cancel).await.expect("battle");
        assert_eq!(rig.game.recorder().clicks(), vec![ScreenPoint::new(1850, 50)]);

        battle.reset();
        battle.execute(&ctx, None, &cancel).await.expect("battle");
        assert_eq!(rig.game.recorder().clicks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_hostiles_sprints_forward_briefly() {
        let rig = TestRig::new(GameState::InBattle);
        let ctx = rig.context();

        handler()
            .execute(&ctx, None, &CancellationToken::new())
            .await
            .expect("battle");

        let recorder = rig.game.recorder();
        assert_eq!(recorder.key_down_count("W"), 1);
        assert_eq!(recorder.key_down_count("LSHIFT"), 1);
        assert!(recorder.held_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn main_menu_on_screen_skips_the_pass() {
        let rig = TestRig::new(GameState::InBattle);
        rig.game.set_entities(vec![monster(1, "Wraith", Vector3::new(800.0, 0.0, 0.0))]);
        let ctx = rig.context();
        let lobby = VisionSnapshot::new(vec![abyssrun_domain::TextRegion::new(
            "坠入深渊",
            0.9,
            ScreenPoint::new(960, 540),
        )]);

        handler()
            .execute(&ctx, Some(&lobby), &CancellationToken::new())
            .await
            .expect("battle");

        assert!(rig.game.recorder().events().is_empty());
    }
}
