//! Buff, candle and relic choice screens.

use std::time::Duration;

use abyssrun_domain::{markers, GameState, TextRegion, VisionSnapshot};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HandlerError, StateContext, StateHandler};

/// Choices are offered in the right-hand pane; the left pane repeats
/// already owned items.
const CHOICE_PANE_MIN_X: i32 = 640;

const BUTTON_TIMEOUT: Duration = Duration::from_secs(2);

fn in_choice_pane(region: &TextRegion) -> bool {
    region.center.x > CHOICE_PANE_MIN_X
}

fn choice<'a>(snapshot: &'a VisionSnapshot, label: &str) -> Option<&'a TextRegion> {
    snapshot.find_where(label, in_choice_pane)
}

pub struct BuffSelectionHandler;

#[async_trait]
impl StateHandler for BuffSelectionHandler {
    fn state(&self) -> GameState {
        GameState::SelectingBuff
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

        let preferred = snapshot
            .regions
            .iter()
            .find(|r| {
                r.text.contains(markers::BUFF_TRAIL)
                    && r.text.contains(markers::BUFF_OBTAIN)
                    && in_choice_pane(r)
            })
            .or_else(|| choice(snapshot, markers::BUFF_RANGED_WEAPON));

        match preferred {
            Some(buff) => {
                tracing::info!(buff = %buff.text, "Picking buff");
                ctx.input.click(buff.center);
                ctx.pause(Duration::from_millis(300), cancel).await?;
            }
            None => {
                tracing::info!("No preferred buff, abandoning");
                ctx.waiter
                    .wait_and_click(&[markers::ABANDON], BUTTON_TIMEOUT, cancel)
                    .await;
            }
        }

        if ctx.waiter.wait_and_click(&[markers::SELECT], BUTTON_TIMEOUT, cancel).await {
            ctx.pause(Duration::from_millis(300), cancel).await?;
        }
        if ctx.waiter.wait_and_click(&[markers::CONFIRM], BUTTON_TIMEOUT, cancel).await {
            ctx.settle(Duration::from_secs(3), cancel).await?;
        }
        Ok(())
    }
}

pub struct CandleSelectionHandler;

#[async_trait]
impl StateHandler for CandleSelectionHandler {
    fn state(&self) -> GameState {
        GameState::SelectingCandle
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

        let pick = [
            markers::CANDLE_SHADOW_BUTTERFLY,
            markers::CANDLE_SEA_MOON,
            markers::ABANDON,
        ]
        .iter()
        .find_map(|label| choice(snapshot, label));

        if let Some(candle) = pick {
            tracing::info!(candle = %candle.text, "Picking candle");
            ctx.input.click(candle.center);
            ctx.pause(Duration::from_millis(300), cancel).await?;
        }

        if ctx.waiter.wait_and_click(&[markers::SELECT], BUTTON_TIMEOUT, cancel).await {
            ctx.settle(Duration::from_secs(2), cancel).await?;
        }
        Ok(())
    }
}

/// Relics are always declined.
pub struct RelicSelectionHandler;

#[async_trait]
impl StateHandler for RelicSelectionHandler {
    fn state(&self) -> GameState {
        GameState::SelectingRelic
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

        if let Some(abandon) = snapshot.find(markers::ABANDON) {
            ctx.input.click(abandon.center);
            ctx.pause(Duration::from_secs(1), cancel).await?;
        }
        if ctx.waiter.wait_and_click(&[markers::CONFIRM], BUTTON_TIMEOUT, cancel).await {
            ctx.settle(Duration::from_secs(2), cancel).await?;
        }
        Ok(())
    }
}
