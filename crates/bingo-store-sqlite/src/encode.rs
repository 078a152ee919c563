//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Booleans are `0`/`1` integers.

use bingo_core::{
  fact::{Fact, Guess},
  player::{Player, ScoreEntry},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── Counts ───────────────────────────────────────────────────────────────────

pub fn decode_count(n: i64) -> Result<u32> {
  u32::try_from(n).map_err(|_| Error::Decode(format!("count out of range: {n}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `players` row.
pub struct RawPlayer {
  pub player_id:  String,
  pub name:       String,
  pub created_at: String,
}

impl RawPlayer {
  /// Column order: `player_id, name, created_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      player_id:  row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_player(self) -> Result<Player> {
    Ok(Player {
      player_id:  decode_uuid(&self.player_id)?,
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `facts` row.
pub struct RawFact {
  pub fact_id:    String,
  pub author_id:  String,
  pub text:       String,
  pub created_at: String,
}

impl RawFact {
  /// Column order: `fact_id, author_id, text, created_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      fact_id:    row.get(0)?,
      author_id:  row.get(1)?,
      text:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_fact(self) -> Result<Fact> {
    Ok(Fact {
      fact_id:    decode_uuid(&self.fact_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      text:       self.text,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `guesses` row.
pub struct RawGuess {
  pub guess_id:          String,
  pub guesser_id:        String,
  pub fact_id:           Option<String>,
  pub claimed_author_id: String,
  pub is_correct:        bool,
  pub created_at:        String,
}

impl RawGuess {
  /// Column order: `guess_id, guesser_id, fact_id, claimed_author_id,
  /// is_correct, created_at`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      guess_id:          row.get(0)?,
      guesser_id:        row.get(1)?,
      fact_id:           row.get(2)?,
      claimed_author_id: row.get(3)?,
      is_correct:        row.get(4)?,
      created_at:        row.get(5)?,
    })
  }

  pub fn into_guess(self) -> Result<Guess> {
    Ok(Guess {
      guess_id:          decode_uuid(&self.guess_id)?,
      guesser_id:        decode_uuid(&self.guesser_id)?,
      fact_id:           self.fact_id.as_deref().map(decode_uuid).transpose()?,
      claimed_author_id: decode_uuid(&self.claimed_author_id)?,
      is_correct:        self.is_correct,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// One leaderboard row before decoding.
pub struct RawScore {
  pub player_id: String,
  pub name:      String,
  pub score:     i64,
}

impl RawScore {
  pub fn into_entry(self) -> Result<ScoreEntry> {
    Ok(ScoreEntry {
      player_id: decode_uuid(&self.player_id)?,
      name:      self.name,
      score:     decode_count(self.score)?,
    })
  }
}
