use std::time::Duration;

use abyssrun_domain::{markers, GameState, VisionSnapshot};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};

/// Button labels sit slightly above the clickable centre.
const BUTTON_NUDGE_Y: i32 = 5;

/// Enters the abyss from the lobby.
pub struct MainMenuHandler;

#[async_trait]
impl StateHandler for MainMenuHandler {
    fn state(&self) -> GameState {
        GameState::MainMenu
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let Some(snapshot) = snapshot else {
            return Ok(());
        };

        if let Some(dive) = snapshot.find(markers::DIVE_INTO_ABYSS) {
            tracing::info!("Entering the abyss");
            ctx.input.click(dive.center.offset(0, BUTTON_NUDGE_Y));
            let started = ctx
                .waiter
                .wait_and_click(&[markers::START_EXPLORATION], Duration::from_secs(5), cancel)
                .await;
            if !started {
                tracing::debug!("Start button did not appear");
                return Ok(());
            }
            return ctx.settle(Duration::from_secs(2), cancel).await;
        }

        match snapshot.find(markers::START_EXPLORATION) {
            Some(start) => {
                tracing::info!("Starting exploration");
                ctx.input.click(start.center.offset(0, BUTTON_NUDGE_Y));
                Ok(())
            }
            None => ctx.settle(Duration::from_millis(500), cancel).await,
        }
    }
}
