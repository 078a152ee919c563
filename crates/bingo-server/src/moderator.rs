//! Moderator-only routes: lifecycle transitions and the live dashboard.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/moderator/overview` | Phase, counts, winner, full leaderboard |
//! | `GET`  | `/moderator/leaderboard` | Optional `?limit=N` |
//! | `POST` | `/moderator/{start,pause,finish,reset}` | 409 if not allowed now |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use bingo_api::error::store_err;
use bingo_core::{
  lifecycle::{Lifecycle, LifecycleEvent},
  player::{GameStats, Player, ScoreEntry},
  store::GameStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Error, auth::Moderator};

// ─── Overview ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Overview {
  pub lifecycle:       Lifecycle,
  pub stats:           GameStats,
  pub winner:          Option<Player>,
  pub leaderboard:     Vec<ScoreEntry>,
  /// Participants with a live session in this process.
  pub active_sessions: usize,
}

/// `GET /moderator/overview`
pub async fn overview<S>(
  _: Moderator,
  State(state): State<AppState<S>>,
) -> Result<Json<Overview>, Error>
where
  S: GameStore + 'static,
{
  let store = &state.game.store;
  Ok(Json(Overview {
    lifecycle:       store.lifecycle().await.map_err(store_err)?,
    stats:           store.stats().await.map_err(store_err)?,
    winner:          store.winner().await.map_err(store_err)?,
    leaderboard:     store.leaderboard(None).await.map_err(store_err)?,
    active_sessions: state.game.sessions.len(),
  }))
}

// ─── Leaderboard ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
  pub limit: Option<usize>,
}

/// `GET /moderator/leaderboard[?limit=N]`
pub async fn leaderboard<S>(
  _: Moderator,
  State(state): State<AppState<S>>,
  Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<ScoreEntry>>, Error>
where
  S: GameStore + 'static,
{
  let rows = state
    .game
    .store
    .leaderboard(params.limit)
    .await
    .map_err(store_err)?;
  Ok(Json(rows))
}

// ─── Transitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Transition {
  pub event: LifecycleEvent,
  pub from:  Lifecycle,
  pub to:    Lifecycle,
}

/// `POST /moderator/{event}` where `event` is `start`, `pause`, `finish` or
/// `reset`.
///
/// Reset wipes every table and forgets all participant sessions; the empty
/// settings table reads back as registration.
pub async fn transition<S>(
  _: Moderator,
  State(state): State<AppState<S>>,
  Path(event): Path<LifecycleEvent>,
) -> Result<Json<Transition>, Error>
where
  S: GameStore + 'static,
{
  let store = &state.game.store;
  let from = store.lifecycle().await.map_err(store_err)?;
  let to = from.apply(event).map_err(bingo_core::Error::from)?;

  if event == LifecycleEvent::Reset {
    store.reset().await.map_err(store_err)?;
    state.game.sessions.clear();
  } else {
    store.set_lifecycle(to).await.map_err(store_err)?;
  }

  tracing::info!(%event, %from, %to, "lifecycle transition");
  Ok(Json(Transition { event, from, to }))
}
