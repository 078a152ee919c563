//! JSON REST API for human-bingo participants.
//!
//! Exposes an axum [`Router`] backed by any [`bingo_core::store::GameStore`].
//! Moderator controls, auth, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", bingo_api::api_router(ctx.clone()))
//! ```

pub mod error;
pub mod facts;
pub mod game;
pub mod guesses;
pub mod players;
pub mod sessions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use bingo_core::{rules::GameRules, store::GameStore};

pub use error::ApiError;
pub use sessions::SessionRegistry;

// ─── Shared context ───────────────────────────────────────────────────────────

/// Everything a handler needs: the store, participant sessions, and rules.
///
/// This is the explicit game-session object injected into every handler;
/// nothing reads game state from ambient globals.
pub struct GameContext<S> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionRegistry>,
  pub rules:    Arc<GameRules>,
}

impl<S> GameContext<S> {
  pub fn new(store: Arc<S>, rules: GameRules) -> Self {
    Self {
      store,
      sessions: Arc::new(SessionRegistry::new()),
      rules: Arc::new(rules),
    }
  }
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for GameContext<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      sessions: Arc::clone(&self.sessions),
      rules:    Arc::clone(&self.rules),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the participant API router for `ctx`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(ctx: GameContext<S>) -> Router<()>
where
  S: GameStore + 'static,
{
  Router::new()
    // Game status
    .route("/game", get(game::status::<S>))
    .route("/game/wait", get(game::wait::<S>))
    // Players
    .route("/players", post(players::join::<S>))
    .route("/players/{id}", get(players::get_one::<S>))
    .route("/players/{id}/others", get(players::others::<S>))
    // Facts
    .route(
      "/players/{id}/facts",
      get(facts::list_own::<S>).put(facts::replace::<S>),
    )
    .route("/players/{id}/deck", get(facts::deck::<S>))
    // Guesses
    .route("/guesses", post(guesses::create::<S>))
    .with_state(ctx)
}
