//! The `GameStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `bingo-store-sqlite`).
//! Higher layers (`bingo-api`, `bingo-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  fact::{Fact, GuessOutcome, NewGuess},
  lifecycle::Lifecycle,
  player::{GameStats, Player, ScoreEntry},
};

/// Abstraction over a human-bingo game store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GameStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Settings ──────────────────────────────────────────────────────────

  /// Insert or overwrite a process-wide setting.
  fn set_setting<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Read a setting, falling back to `default` when it is absent.
  fn get_setting<'a>(
    &'a self,
    key: &'a str,
    default: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// The current lifecycle, decoded from the `started`/`finished` settings.
  fn lifecycle(&self) -> impl Future<Output = Result<Lifecycle, Self::Error>> + Send + '_;

  /// Persist `state` by writing both lifecycle settings.
  fn set_lifecycle(
    &self,
    state: Lifecycle,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Players ───────────────────────────────────────────────────────────

  /// Look up a player by exact (trimmed, case-sensitive) name, creating the
  /// row if none exists. Concurrent calls with the same name resolve to the
  /// same player.
  fn get_or_create_player<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Player, Self::Error>> + Send + 'a;

  fn get_player(
    &self,
    player_id: Uuid,
  ) -> impl Future<Output = Result<Option<Player>, Self::Error>> + Send + '_;

  fn list_players(&self) -> impl Future<Output = Result<Vec<Player>, Self::Error>> + Send + '_;

  /// Every player except `player_id`, ordered by name.
  fn list_other_players(
    &self,
    player_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Player>, Self::Error>> + Send + '_;

  // ── Facts ─────────────────────────────────────────────────────────────

  /// Replace all of a player's facts. Entries are trimmed and blank ones are
  /// dropped; the previous set is deleted in the same transaction.
  fn replace_facts(
    &self,
    player_id: Uuid,
    facts: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + '_;

  /// The facts authored by `player_id`.
  fn list_facts_for_author(
    &self,
    player_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + '_;

  /// Facts not authored by `player_id`. With `exclude_solved`, facts the
  /// player has already guessed correctly are left out as well.
  fn list_facts_excluding_self(
    &self,
    player_id: Uuid,
    exclude_solved: bool,
  ) -> impl Future<Output = Result<Vec<Fact>, Self::Error>> + Send + '_;

  // ── Guesses ───────────────────────────────────────────────────────────

  /// Record or update a guess and report whether it was correct.
  ///
  /// Fails with a stale-fact error if the fact no longer exists and with an
  /// own-fact error if the guesser wrote it. A guess that is already correct
  /// is final and is left untouched.
  fn record_guess(
    &self,
    guess: NewGuess,
  ) -> impl Future<Output = Result<GuessOutcome, Self::Error>> + Send + '_;

  /// Number of correct guesses made by `player_id`.
  fn player_score(
    &self,
    player_id: Uuid,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// All players ranked by score (descending), ties broken by name.
  fn leaderboard(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<ScoreEntry>, Self::Error>> + Send + '_;

  // ── Winner ────────────────────────────────────────────────────────────

  /// Record `player_id` as the winner unless one is already recorded.
  /// Returns `true` if this call claimed the win.
  fn claim_winner(
    &self,
    player_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn winner(&self) -> impl Future<Output = Result<Option<Player>, Self::Error>> + Send + '_;

  // ── Administration ────────────────────────────────────────────────────

  fn stats(&self) -> impl Future<Output = Result<GameStats, Self::Error>> + Send + '_;

  /// Delete every player, fact, guess and setting.
  fn reset(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
