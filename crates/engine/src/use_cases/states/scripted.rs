//! Short fixed-script states: overlays, interaction prompts, revive and the
//! exploration summary.

use std::time::Duration;

use abyssrun_domain::{markers, GameState, VisionSnapshot};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};
use crate::infrastructure::ports::keys;
use crate::use_cases::navigation::HeldInputs;

/// Dismisses reward and result overlays through the close button.
pub struct ClosingUiHandler;

#[async_trait]
impl StateHandler for ClosingUiHandler {
    fn state(&self) -> GameState {
        GameState::ClosingUI
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let overlay = snapshot.is_some_and(|s| s.contains_any(&markers::CLOSE_OVERLAY_MARKERS));
        if !overlay {
            return ctx.pause(Duration::from_millis(200), cancel).await;
        }
        ctx.input.click(ctx.client_size().close_button());
        ctx.settle(Duration::from_millis(500), cancel).await
    }
}

pub struct InteractingHandler;

#[async_trait]
impl StateHandler for InteractingHandler {
    fn state(&self) -> GameState {
        GameState::Interacting
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        _snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        ctx.input.press(keys::INTERACT);
        ctx.settle(Duration::from_millis(500), cancel).await
    }
}

/// Holds the revive key until the prompt goes away.
pub struct RevivingHandler;

#[async_trait]
impl StateHandler for RevivingHandler {
    fn state(&self) -> GameState {
        GameState::Reviving
    }

    async fn execute(
        &mut self,
        ctx: &StateContext,
        _snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError> {
        let mut held = HeldInputs::new(ctx.input.clone());
        held.hold_key(keys::REVIVE);
        let revived = ctx
            .waiter
            .wait_for_text_disappear(markers::REVIVE, Duration::from_secs(3), cancel)
            .await;
        held.release_all();

        if cancel.is_cancelled() {
            return Err(HandlerError::Interrupted);
        }
        tracing::info!(revived, "Revive attempt finished");
        Ok(())
    }
}

/// Clicks through the summary tabs, then closes the screen.
pub struct ExploreDetailsHandler;

const SUMMARY_CLOSE_HOLD: Duration = Duration::from_millis(1200);

#[async_trait]
impl StateHandler for ExploreDetailsHandler {
    fn state(&self) -> GameState {
        GameState::ExploreDetails
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

        let tab = markers::EXPLORE_DETAIL_TABS.iter().find_map(|labels| {
            snapshot
                .regions
                .iter()
                .find(|r| labels.iter().any(|label| r.text.contains(label)))
        });
        if let Some(tab) = tab {
            tracing::debug!(tab = %tab.text, "Opening summary tab");
            ctx.input.click(tab.center);
            ctx.pause(Duration::from_millis(500), cancel).await?;
        }

        ctx.input.send_key(keys::JUMP, SUMMARY_CLOSE_HOLD);
        ctx.pause(Duration::from_millis(100), cancel).await
    }
}
