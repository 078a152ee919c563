//! Handlers for a player's facts and their guessing deck.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/players/:id/facts` | The player's own facts |
//! | `PUT`  | `/players/:id/facts` | Body: `{"facts":[...]}`; registration only |
//! | `GET`  | `/players/:id/deck` | `?page`, `?per_page`; playing only; authors hidden |

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use bingo_core::{
  fact::{Fact, HiddenFact, clean_fact_texts},
  store::GameStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  GameContext,
  error::{ApiError, store_err},
  players::{require_player, touch_session},
};

// ─── Own facts ────────────────────────────────────────────────────────────────

/// `GET /players/:id/facts`
pub async fn list_own<S>(
  State(ctx): State<GameContext<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Fact>>, ApiError>
where
  S: GameStore,
{
  require_player(ctx.store.as_ref(), id).await?;
  let facts = ctx
    .store
    .list_facts_for_author(id)
    .await
    .map_err(store_err)?;
  Ok(Json(facts))
}

// ─── Replace ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitFactsBody {
  pub facts: Vec<String>,
}

/// `PUT /players/:id/facts`: replaces the player's whole fact set.
///
/// Only accepted while the game is registering, and only with exactly
/// `facts_per_player` non-blank entries.
pub async fn replace<S>(
  State(ctx): State<GameContext<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<SubmitFactsBody>,
) -> Result<Json<Vec<Fact>>, ApiError>
where
  S: GameStore,
{
  let lifecycle = ctx.store.lifecycle().await.map_err(store_err)?;
  if !lifecycle.accepts_facts() {
    return Err(ApiError::Conflict(format!(
      "facts can only be changed during registration; the game is {lifecycle}"
    )));
  }

  let cleaned = clean_fact_texts(&body.facts);
  let required = ctx.rules.facts_per_player;
  if cleaned.len() != required {
    return Err(ApiError::BadRequest(format!(
      "expected {required} non-blank facts, got {}",
      cleaned.len()
    )));
  }

  require_player(ctx.store.as_ref(), id).await?;
  let facts = ctx
    .store
    .replace_facts(id, cleaned)
    .await
    .map_err(store_err)?;
  ctx.sessions.touch(id, lifecycle, !facts.is_empty());
  tracing::info!(player_id = %id, count = facts.len(), "facts replaced");
  Ok(Json(facts))
}

// ─── Deck ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeckParams {
  /// 1-based page number.
  pub page:     Option<usize>,
  pub per_page: Option<usize>,
}

/// One page of facts still waiting to be solved by the player.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeckPage {
  pub page:     usize,
  pub per_page: usize,
  pub total:    usize,
  pub facts:    Vec<HiddenFact>,
}

/// `GET /players/:id/deck[?page=N][&per_page=M]`
///
/// Facts written by others that the player has not yet guessed correctly,
/// in a shuffled order that stays fixed for the participant's session.
pub async fn deck<S>(
  State(ctx): State<GameContext<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DeckParams>,
) -> Result<Json<DeckPage>, ApiError>
where
  S: GameStore,
{
  require_player(ctx.store.as_ref(), id).await?;
  let lifecycle = ctx.store.lifecycle().await.map_err(store_err)?;
  if !lifecycle.accepts_guesses() {
    return Err(ApiError::Conflict(format!(
      "the deck is only available while playing; the game is {lifecycle}"
    )));
  }
  touch_session(&ctx, id).await?;

  let page = params.page.unwrap_or(1).max(1);
  let per_page = params
    .per_page
    .unwrap_or(ctx.rules.page_size)
    .clamp(1, ctx.rules.max_page_size);

  let available = ctx
    .store
    .list_facts_excluding_self(id, true)
    .await
    .map_err(store_err)?;
  let ids: Vec<Uuid> = available.iter().map(|f| f.fact_id).collect();
  let slice = ctx.sessions.deck_page(id, &ids, page, per_page);

  let mut by_id: HashMap<Uuid, Fact> =
    available.into_iter().map(|f| (f.fact_id, f)).collect();
  let facts = slice
    .fact_ids
    .iter()
    .filter_map(|fid| by_id.remove(fid))
    .map(HiddenFact::from)
    .collect();

  Ok(Json(DeckPage { page, per_page, total: slice.total, facts }))
}
