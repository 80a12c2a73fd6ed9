use std::time::Duration;

use abyssrun_domain::{markers, GameState, VisionSnapshot};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};
use crate::infrastructure::ports::keys;

const MENU_TIMEOUT: Duration = Duration::from_secs(10);

/// Leaves the current run through the pause menu.
pub struct ForceExitHandler;

#[async_trait]
impl StateHandler for ForceExitHandler {
    fn state(&self) -> GameState {
        GameState::ForceExiting
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        _snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        tracing::info!("Leaving the abyss");
        ctx.input.press(keys::ESCAPE);
        ctx.pause(Duration::from_secs(1), cancel).await?;

        if !ctx.waiter.wait_and_click(&[markers::EXIT], MENU_TIMEOUT, cancel).await {
            tracing::warn!("Exit button not found");
            return Ok(());
        }
        ctx.pause(Duration::from_millis(500), cancel).await?;

        if !ctx.waiter.wait_and_click(&[markers::CONFIRM], MENU_TIMEOUT, cancel).await {
            tracing::warn!("Exit confirmation not found");
            return Ok(());
        }
        ctx.pause(Duration::from_secs(2), cancel).await?;

        ctx.settle(Duration::from_secs(3), cancel).await
    }
}
