//! Handler for `POST /guesses`.

use axum::{Json, extract::State};
use bingo_core::{
  fact::{Guess, NewGuess},
  store::GameStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  GameContext,
  error::{ApiError, store_err},
};

/// Result of a guess as reported to the guesser.
///
/// The true author is deliberately absent: a wrong guess only learns that it
/// was wrong.
#[derive(Debug, Serialize, Deserialize)]
pub struct GuessResponse {
  pub correct: bool,
  pub score:   u32,
  /// `true` if this guess made the guesser the game's winner.
  pub won:     bool,
  /// Name of the winner, if one has been recorded.
  pub winner:  Option<String>,
  pub guess:   Guess,
}

/// `POST /guesses`: body: `{"guesser_id","fact_id","claimed_author_id"}`
pub async fn create<S>(
  State(ctx): State<GameContext<S>>,
  Json(body): Json<NewGuess>,
) -> Result<Json<GuessResponse>, ApiError>
where
  S: GameStore,
{
  let lifecycle = ctx.store.lifecycle().await.map_err(store_err)?;
  if !lifecycle.accepts_guesses() {
    return Err(ApiError::Conflict(format!(
      "guesses are only accepted while playing; the game is {lifecycle}"
    )));
  }

  let outcome = ctx.store.record_guess(body).await.map_err(store_err)?;
  tracing::debug!(
    guesser_id = %body.guesser_id,
    fact_id = %body.fact_id,
    correct = outcome.is_correct(),
    score = outcome.score,
    "guess recorded"
  );

  let mut won = false;
  if outcome.is_correct() && outcome.score >= ctx.rules.win_target {
    won = ctx
      .store
      .claim_winner(body.guesser_id)
      .await
      .map_err(store_err)?;
    if won {
      tracing::info!(player_id = %body.guesser_id, score = outcome.score, "winner recorded");
    }
  }
  let winner = ctx.store.winner().await.map_err(store_err)?.map(|p| p.name);

  Ok(Json(GuessResponse {
    correct: outcome.is_correct(),
    score: outcome.score,
    won,
    winner,
    guess: outcome.guess,
  }))
}
