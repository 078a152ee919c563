//! Handlers for `/players` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/players` | Body: `{"name":"..."}`; get-or-create |
//! | `GET`  | `/players/:id` | Player, session, and score; 404 if not found |
//! | `GET`  | `/players/:id/others` | Everyone else, ordered by name |

use axum::{
  Json,
  extract::{Path, State},
};
use bingo_core::{player::Player, session::ParticipantSession, store::GameStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  GameContext,
  error::{ApiError, store_err},
};

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// Fetch a player or fail with 404.
pub(crate) async fn require_player<S: GameStore>(
  store: &S,
  player_id: Uuid,
) -> Result<Player, ApiError> {
  store
    .get_player(player_id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("player {player_id} not found")))
}

/// Re-resolve a participant's session from the store's current state.
pub(crate) async fn touch_session<S: GameStore>(
  ctx: &GameContext<S>,
  player_id: Uuid,
) -> Result<ParticipantSession, ApiError> {
  let lifecycle = ctx.store.lifecycle().await.map_err(store_err)?;
  let submitted = !ctx
    .store
    .list_facts_for_author(player_id)
    .await
    .map_err(store_err)?
    .is_empty();
  Ok(ctx.sessions.touch(player_id, lifecycle, submitted))
}

/// A player together with their session and current score.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerView {
  pub player:  Player,
  pub session: ParticipantSession,
  pub score:   u32,
}

async fn player_view<S: GameStore>(
  ctx: &GameContext<S>,
  player: Player,
) -> Result<PlayerView, ApiError> {
  let session = touch_session(ctx, player.player_id).await?;
  let score = ctx
    .store
    .player_score(player.player_id)
    .await
    .map_err(store_err)?;
  Ok(PlayerView { player, session, score })
}

// ─── Join ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub name: String,
}

/// `POST /players`: body: `{"name":"Alice"}`
///
/// Joining twice with the same name returns the same player.
pub async fn join<S>(
  State(ctx): State<GameContext<S>>,
  Json(body): Json<JoinBody>,
) -> Result<Json<PlayerView>, ApiError>
where
  S: GameStore,
{
  let player = ctx
    .store
    .get_or_create_player(&body.name)
    .await
    .map_err(store_err)?;
  tracing::info!(player_id = %player.player_id, name = %player.name, "participant joined");
  Ok(Json(player_view(&ctx, player).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /players/:id`
pub async fn get_one<S>(
  State(ctx): State<GameContext<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PlayerView>, ApiError>
where
  S: GameStore,
{
  let player = require_player(ctx.store.as_ref(), id).await?;
  Ok(Json(player_view(&ctx, player).await?))
}

// ─── Others ───────────────────────────────────────────────────────────────────

/// `GET /players/:id/others`: the candidate authors for a guess.
pub async fn others<S>(
  State(ctx): State<GameContext<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Player>>, ApiError>
where
  S: GameStore,
{
  require_player(ctx.store.as_ref(), id).await?;
  let players = ctx
    .store
    .list_other_players(id)
    .await
    .map_err(store_err)?;
  Ok(Json(players))
}
