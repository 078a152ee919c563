//! Handlers for `/game` endpoints: the public status banner and the
//! wait-for-start long poll.

use std::time::Duration;

use axum::{
  Json,
  extract::{Query, State},
};
use bingo_core::{lifecycle::Lifecycle, store::GameStore};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};

use crate::{
  GameContext,
  error::{ApiError, store_err},
};

const DEFAULT_WAIT: Duration = Duration::from_secs(30);
const MAX_WAIT: Duration = Duration::from_secs(60);

/// What every participant screen shows at the top.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameStatus {
  pub lifecycle: Lifecycle,
  /// Display name of the first player to reach the win target.
  pub winner:    Option<String>,
}

async fn load_status<S: GameStore>(store: &S) -> Result<GameStatus, ApiError> {
  let lifecycle = store.lifecycle().await.map_err(store_err)?;
  let winner = store.winner().await.map_err(store_err)?.map(|p| p.name);
  Ok(GameStatus { lifecycle, winner })
}

/// `GET /game`
pub async fn status<S>(
  State(ctx): State<GameContext<S>>,
) -> Result<Json<GameStatus>, ApiError>
where
  S: GameStore,
{
  Ok(Json(load_status(ctx.store.as_ref()).await?))
}

#[derive(Debug, Deserialize)]
pub struct WaitParams {
  /// Give up after this many seconds (default 30, capped at 60).
  pub timeout_secs: Option<u64>,
}

/// `GET /game/wait[?timeout_secs=N]`
///
/// Re-reads the lifecycle every poll interval and returns as soon as the game
/// has left registration, or with the current status once the timeout
/// elapses.
pub async fn wait<S>(
  State(ctx): State<GameContext<S>>,
  Query(params): Query<WaitParams>,
) -> Result<Json<GameStatus>, ApiError>
where
  S: GameStore,
{
  let timeout = params
    .timeout_secs
    .map_or(DEFAULT_WAIT, Duration::from_secs)
    .min(MAX_WAIT);
  let deadline = Instant::now() + timeout;

  loop {
    let lifecycle = ctx.store.lifecycle().await.map_err(store_err)?;
    if lifecycle != Lifecycle::Registering || Instant::now() >= deadline {
      break;
    }
    let remaining = deadline.saturating_duration_since(Instant::now());
    sleep(ctx.rules.poll_interval.min(remaining)).await;
  }

  Ok(Json(load_status(ctx.store.as_ref()).await?))
}
