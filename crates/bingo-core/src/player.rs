//! Players and the score views derived from their guesses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A participant, identified by a unique display name.
///
/// Players are created on first appearance of a name and are never updated;
/// only a full reset removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
  pub player_id:  Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
  pub player_id: Uuid,
  pub name:      String,
  /// Number of correct guesses made by this player.
  pub score:     u32,
}

/// Row counts shown on the moderator dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
  pub players: u64,
  pub facts:   u64,
  pub guesses: u64,
}
