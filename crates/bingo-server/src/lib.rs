//! HTTP server for human bingo.
//!
//! Mounts the participant API from [`bingo_api`] under `/api` and adds the
//! PIN-protected moderator routes under `/moderator`.

pub mod auth;
pub mod error;
pub mod moderator;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{
  Router,
  routing::{get, post},
};
use bingo_api::GameContext;
use bingo_core::{rules::GameRules, store::GameStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `BINGO_*` environment variables. Every field has a default.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Plain moderator PIN. Ignored when `moderator_pin_hash` is set.
  pub moderator_pin:      String,
  /// argon2 PHC string, see `server --hash-pin`.
  pub moderator_pin_hash: Option<String>,
  pub busy_timeout_ms:    u64,
  pub facts_per_player:   usize,
  pub win_target:         u32,
  pub page_size:          usize,
  pub poll_interval_ms:   u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let rules = GameRules::default();
    Self {
      host:               "127.0.0.1".into(),
      port:               8501,
      store_path:         PathBuf::from("bingo.db"),
      moderator_pin:      "3535".into(),
      moderator_pin_hash: None,
      busy_timeout_ms:    5_000,
      facts_per_player:   rules.facts_per_player,
      win_target:         rules.win_target,
      page_size:          rules.page_size,
      poll_interval_ms:   rules.poll_interval.as_millis() as u64,
    }
  }
}

impl ServerConfig {
  pub fn rules(&self) -> GameRules {
    let defaults = GameRules::default();
    GameRules {
      facts_per_player: self.facts_per_player.max(1),
      win_target:       self.win_target.max(1),
      page_size:        self.page_size.clamp(1, defaults.max_page_size),
      max_page_size:    defaults.max_page_size,
      poll_interval:    Duration::from_millis(self.poll_interval_ms.max(1)),
    }
  }

  pub fn auth(&self) -> AuthConfig {
    match &self.moderator_pin_hash {
      Some(hash) if !hash.trim().is_empty() => AuthConfig::PinHash(hash.clone()),
      _ => AuthConfig::Pin(self.moderator_pin.clone()),
    }
  }

  pub fn busy_timeout(&self) -> Duration {
    Duration::from_millis(self.busy_timeout_ms)
  }
}

/// Load the configuration from `path` (optional) overlaid with `BINGO_*`
/// variables. `env` stands in for the process environment when given.
///
/// Values stay strings until deserialisation, so a PIN like `0123` keeps its
/// leading zero while numeric fields still parse.
pub fn load_config(
  path: &Path,
  env: Option<config::Map<String, String>>,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("BINGO").source(env))
    .build()?
    .try_deserialize()
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the moderator handlers.
pub struct AppState<S> {
  pub game: GameContext<S>,
  pub auth: Arc<AuthConfig>,
}

impl<S> AppState<S> {
  pub fn new(game: GameContext<S>, config: &ServerConfig) -> Self {
    Self { game, auth: Arc::new(config.auth()) }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      game: self.game.clone(),
      auth: Arc::clone(&self.auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: GameStore + 'static,
{
  let api = bingo_api::api_router(state.game.clone());
  Router::new()
    .route("/moderator/overview",    get(moderator::overview::<S>))
    .route("/moderator/leaderboard", get(moderator::leaderboard::<S>))
    .route("/moderator/{event}",     post(moderator::transition::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use bingo_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  fn small_game() -> ServerConfig {
    ServerConfig {
      facts_per_player: 3,
      win_target: 1,
      ..ServerConfig::default()
    }
  }

  async fn app(config: ServerConfig) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let game = GameContext::new(Arc::new(store), config.rules());
    router(AppState::new(game, &config))
  }

  fn moderator_auth(pin: &str) -> String {
    format!("Basic {}", B64.encode(format!("moderator:{pin}")))
  }

  async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    auth: Option<&str>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(pin) = auth {
      builder = builder.header(header::AUTHORIZATION, moderator_auth(pin));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  async fn join(app: &Router, name: &str) -> String {
    let (status, body) =
      send(app, Method::POST, "/api/players", Some(json!({ "name": name })), None).await;
    assert_eq!(status, StatusCode::OK);
    body["player"]["player_id"].as_str().unwrap().to_string()
  }

  async fn submit(app: &Router, id: &str, facts: &[&str]) -> StatusCode {
    let uri = format!("/api/players/{id}/facts");
    send(app, Method::PUT, &uri, Some(json!({ "facts": facts })), None).await.0
  }

  async fn moderate(app: &Router, event: &str) -> (StatusCode, Value) {
    send(app, Method::POST, &format!("/moderator/{event}"), None, Some("3535")).await
  }

  async fn deck(app: &Router, id: &str) -> Value {
    let (status, body) =
      send(app, Method::GET, &format!("/api/players/{id}/deck?per_page=10"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    body
  }

  async fn guess(app: &Router, guesser: &str, fact: &str, author: &str) -> (StatusCode, Value) {
    let body = json!({
      "guesser_id": guesser,
      "fact_id": fact,
      "claimed_author_id": author,
    });
    send(app, Method::POST, "/api/guesses", Some(body), None).await
  }

  #[test]
  fn pin_hash_takes_precedence() {
    let cfg = ServerConfig {
      moderator_pin_hash: Some("$argon2id$v=19$stub".into()),
      ..ServerConfig::default()
    };
    assert!(matches!(cfg.auth(), AuthConfig::PinHash(_)));
    assert!(matches!(ServerConfig::default().auth(), AuthConfig::Pin(p) if p == "3535"));
  }

  fn env(vars: &[(&str, &str)]) -> config::Map<String, String> {
    vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn env_pin_keeps_leading_zeros() {
    let vars = env(&[
      ("BINGO_MODERATOR_PIN", "0123"),
      ("BINGO_PORT", "9000"),
      ("BINGO_WIN_TARGET", "3"),
    ]);
    let cfg = load_config(Path::new("no-such-bingo-config.toml"), Some(vars)).unwrap();
    assert_eq!(cfg.moderator_pin, "0123");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.win_target, 3);
    assert!(matches!(cfg.auth(), AuthConfig::Pin(p) if p == "0123"));
  }

  #[test]
  fn missing_config_uses_defaults() {
    let cfg = load_config(Path::new("no-such-bingo-config.toml"), Some(env(&[]))).unwrap();
    assert_eq!(cfg.moderator_pin, "3535");
    assert_eq!(cfg.port, 8501);
    assert_eq!(cfg.facts_per_player, 5);
  }

  #[tokio::test]
  async fn moderator_routes_require_pin() {
    let app = app(small_game()).await;
    let (status, _) = send(&app, Method::GET, "/moderator/overview", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::POST, "/moderator/start", None, Some("0000")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = send(&app, Method::GET, "/api/game", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lifecycle"], "registering");
  }

  #[tokio::test]
  async fn full_game_flow() {
    let app = app(small_game()).await;
    let alice = join(&app, "alice").await;
    let bob = join(&app, "bob").await;
    assert_eq!(submit(&app, &alice, &["a1", "a2", "a3"]).await, StatusCode::OK);
    assert_eq!(submit(&app, &bob, &["b1", "b2", "b3"]).await, StatusCode::OK);

    let (status, body) = moderate(&app, "start").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "registering");
    assert_eq!(body["to"], "playing");

    let alice_deck = deck(&app, &alice).await;
    assert_eq!(alice_deck["total"], 3);
    let first = &alice_deck["facts"][0];
    assert!(first.get("author_id").is_none());
    let fact_id = first["fact_id"].as_str().unwrap();

    let (status, body) = guess(&app, &alice, fact_id, &bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct"], true);
    assert_eq!(body["score"], 1);
    assert_eq!(body["won"], true);
    assert_eq!(body["winner"], "alice");

    let bob_deck = deck(&app, &bob).await;
    let alice_fact = bob_deck["facts"][0]["fact_id"].as_str().unwrap();
    let (_, body) = guess(&app, &bob, alice_fact, &alice).await;
    assert_eq!(body["correct"], true);
    assert_eq!(body["won"], false);
    assert_eq!(body["winner"], "alice");

    assert_eq!(deck(&app, &alice).await["total"], 2);

    let (status, overview) =
      send(&app, Method::GET, "/moderator/overview", None, Some("3535")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(overview["lifecycle"], "playing");
    assert_eq!(overview["winner"]["name"], "alice");
    assert_eq!(overview["stats"]["guesses"], 2);
    assert_eq!(overview["leaderboard"].as_array().unwrap().len(), 2);
    assert_eq!(overview["active_sessions"], 2);

    let (status, top) =
      send(&app, Method::GET, "/moderator/leaderboard?limit=1", None, Some("3535")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top.as_array().unwrap().len(), 1);
    assert_eq!(top[0]["name"], "alice");

    assert_eq!(moderate(&app, "finish").await.0, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/api/game", None, None).await;
    assert_eq!(body["lifecycle"], "finished");
    assert_eq!(body["winner"], "alice");
  }

  #[tokio::test]
  async fn wrong_guess_reports_nothing_about_the_author() {
    let app = app(small_game()).await;
    let alice = join(&app, "alice").await;
    let bob = join(&app, "bob").await;
    let carol = join(&app, "carol").await;
    submit(&app, &bob, &["b1", "b2", "b3"]).await;
    moderate(&app, "start").await;

    let fact = deck(&app, &alice).await["facts"][0]["fact_id"]
      .as_str()
      .unwrap()
      .to_string();
    let (status, body) = guess(&app, &alice, &fact, &carol).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["correct"], false);
    assert_eq!(body["score"], 0);
    assert!(body.get("true_author_id").is_none());
    assert_eq!(body["winner"], Value::Null);
  }

  #[tokio::test]
  async fn phase_gates() {
    let app = app(small_game()).await;
    let alice = join(&app, "alice").await;
    let bob = join(&app, "bob").await;
    submit(&app, &bob, &["b1", "b2", "b3"]).await;
    let bob_fact = {
      let uri = format!("/api/players/{bob}/facts");
      let (_, facts) = send(&app, Method::GET, &uri, None, None).await;
      facts[0]["fact_id"].as_str().unwrap().to_string()
    };

    let (status, _) = guess(&app, &alice, &bob_fact, &bob).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let uri = format!("/api/players/{alice}/deck");
    assert_eq!(send(&app, Method::GET, &uri, None, None).await.0, StatusCode::CONFLICT);

    moderate(&app, "start").await;
    assert_eq!(submit(&app, &alice, &["a1", "a2", "a3"]).await, StatusCode::CONFLICT);

    let (status, body) = moderate(&app, "start").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("playing"));
  }

  #[tokio::test]
  async fn fact_count_must_match_rules() {
    let app = app(small_game()).await;
    let alice = join(&app, "alice").await;
    assert_eq!(submit(&app, &alice, &["a1", "a2"]).await, StatusCode::BAD_REQUEST);
    assert_eq!(submit(&app, &alice, &["a1", "a2", "   "]).await, StatusCode::BAD_REQUEST);
    assert_eq!(submit(&app, &alice, &["a1", "a2", "a3"]).await, StatusCode::OK);
  }

  #[tokio::test]
  async fn guess_on_replaced_fact_is_stale() {
    let app = app(small_game()).await;
    let alice = join(&app, "alice").await;
    let bob = join(&app, "bob").await;
    submit(&app, &alice, &["a1", "a2", "a3"]).await;
    moderate(&app, "start").await;
    let old = deck(&app, &bob).await["facts"][0]["fact_id"]
      .as_str()
      .unwrap()
      .to_string();

    assert_eq!(moderate(&app, "pause").await.0, StatusCode::OK);
    submit(&app, &alice, &["x1", "x2", "x3"]).await;
    moderate(&app, "start").await;

    let (status, _) = guess(&app, &bob, &old, &alice).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn reset_clears_everything() {
    let app = app(small_game()).await;
    let alice = join(&app, "alice").await;
    submit(&app, &alice, &["a1", "a2", "a3"]).await;
    moderate(&app, "start").await;
    moderate(&app, "finish").await;

    let (status, body) = moderate(&app, "reset").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["to"], "registering");

    let (_, overview) =
      send(&app, Method::GET, "/moderator/overview", None, Some("3535")).await;
    assert_eq!(overview["lifecycle"], "registering");
    assert_eq!(overview["stats"], json!({ "players": 0, "facts": 0, "guesses": 0 }));
    assert_eq!(overview["active_sessions"], 0);
    assert_eq!(overview["winner"], Value::Null);

    let uri = format!("/api/players/{alice}");
    assert_eq!(send(&app, Method::GET, &uri, None, None).await.0, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn wait_returns_once_the_game_starts() {
    let app = app(ServerConfig { poll_interval_ms: 10, ..small_game() }).await;

    let waiter = tokio::spawn({
      let app = app.clone();
      async move { send(&app, Method::GET, "/api/game/wait?timeout_secs=10", None, None).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());
    assert_eq!(moderate(&app, "start").await.0, StatusCode::OK);

    let (status, body) = tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
      .await
      .expect("wait did not return after start")
      .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lifecycle"], "playing");
  }

  #[tokio::test]
  async fn wait_times_out_with_current_status() {
    let app = app(ServerConfig { poll_interval_ms: 10, ..small_game() }).await;
    let (status, body) =
      send(&app, Method::GET, "/api/game/wait?timeout_secs=0", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lifecycle"], "registering");
    assert_eq!(body["winner"], Value::Null);
  }

  #[tokio::test]
  async fn unknown_moderator_event_is_rejected() {
    let app = app(small_game()).await;
    let (status, _) = moderate(&app, "explode").await;
    assert!(status.is_client_error());
  }
}
