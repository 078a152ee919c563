//! [`SqliteStore`]: the SQLite implementation of [`GameStore`].

use std::{path::Path, time::Duration};

use bingo_core::{
  fact::{Fact, GuessOutcome, NewGuess, clean_fact_texts},
  lifecycle::{
    FINISHED_KEY, Lifecycle, STARTED_KEY, WINNER_KEY, decode_flag, encode_flag,
  },
  player::{GameStats, Player, ScoreEntry},
  store::GameStore,
};
use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawFact, RawGuess, RawPlayer, RawScore, decode_count, decode_uuid, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

/// How long a connection waits on another writer before reporting busy.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PLAYER_COLUMNS: &str = "player_id, name, created_at";
const FACT_COLUMNS: &str = "f.fact_id, f.author_id, f.text, f.created_at";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A game store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Separate
/// `SqliteStore`s opened on the same path behave like separate clients and
/// rely on SQLite's own write serialisation.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` with [`DEFAULT_BUSY_TIMEOUT`].
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT).await
  }

  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open_with_busy_timeout(
    path: impl AsRef<Path>,
    busy_timeout: Duration,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema(busy_timeout).await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema(DEFAULT_BUSY_TIMEOUT).await?;
    Ok(store)
  }

  async fn init_schema(&self, busy_timeout: Duration) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn read_setting(
  conn: &rusqlite::Connection,
  key: &str,
) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT value FROM settings WHERE key = ?1",
      rusqlite::params![key],
      |r| r.get(0),
    )
    .optional()
}

fn write_setting(
  conn: &rusqlite::Connection,
  key: &str,
  value: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO settings (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    rusqlite::params![key, value],
  )?;
  Ok(())
}

fn player_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM players WHERE player_id = ?1",
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

fn correct_count(conn: &rusqlite::Connection, guesser: &str) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM guesses WHERE guesser_id = ?1 AND is_correct = 1",
    rusqlite::params![guesser],
    |r| r.get(0),
  )
}

// ─── GameStore impl ──────────────────────────────────────────────────────────

impl GameStore for SqliteStore {
  type Error = Error;

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
    let key = key.to_owned();
    let value = value.to_owned();

    self
      .conn
      .call(move |conn| Ok(write_setting(conn, &key, &value)?))
      .await?;
    Ok(())
  }

  async fn get_setting(&self, key: &str, default: &str) -> Result<String> {
    let key = key.to_owned();

    let value = self
      .conn
      .call(move |conn| Ok(read_setting(conn, &key)?))
      .await?;
    Ok(value.unwrap_or_else(|| default.to_owned()))
  }

  async fn lifecycle(&self) -> Result<Lifecycle> {
    let (started, finished) = self
      .conn
      .call(|conn| {
        Ok((
          read_setting(conn, STARTED_KEY)?,
          read_setting(conn, FINISHED_KEY)?,
        ))
      })
      .await?;

    Ok(Lifecycle::from_flags(
      started.as_deref().is_some_and(decode_flag),
      finished.as_deref().is_some_and(decode_flag),
    ))
  }

  async fn set_lifecycle(&self, state: Lifecycle) -> Result<()> {
    let (started, finished) = state.flags();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_setting(&tx, STARTED_KEY, encode_flag(started))?;
        write_setting(&tx, FINISHED_KEY, encode_flag(finished))?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Players ───────────────────────────────────────────────────────────────

  async fn get_or_create_player(&self, name: &str) -> Result<Player> {
    let name = name.trim().to_owned();
    if name.is_empty() {
      return Err(bingo_core::Error::BlankName.into());
    }

    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(Utc::now());

    // The loser of a concurrent insert hits the UNIQUE constraint, inserts
    // nothing, and reads back the winner's row.
    let raw: RawPlayer = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO players (player_id, name, created_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(name) DO NOTHING",
          rusqlite::params![id_str, name, at_str],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE name = ?1"),
          rusqlite::params![name],
          RawPlayer::from_row,
        )?)
      })
      .await?;

    raw.into_player()
  }

  async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>> {
    let id_str = encode_uuid(player_id);

    let raw: Option<RawPlayer> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = ?1"),
              rusqlite::params![id_str],
              RawPlayer::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPlayer::into_player).transpose()
  }

  async fn list_players(&self) -> Result<Vec<Player>> {
    let raws: Vec<RawPlayer> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {PLAYER_COLUMNS} FROM players ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawPlayer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlayer::into_player).collect()
  }

  async fn list_other_players(&self, player_id: Uuid) -> Result<Vec<Player>> {
    let id_str = encode_uuid(player_id);

    let raws: Vec<RawPlayer> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAYER_COLUMNS} FROM players WHERE player_id != ?1 ORDER BY name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPlayer::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlayer::into_player).collect()
  }

  // ── Facts ─────────────────────────────────────────────────────────────────

  async fn replace_facts(&self, player_id: Uuid, facts: Vec<String>) -> Result<Vec<Fact>> {
    let now = Utc::now();
    let facts: Vec<Fact> = clean_fact_texts(facts)
      .into_iter()
      .map(|text| Fact {
        fact_id: Uuid::new_v4(),
        author_id: player_id,
        text,
        created_at: now,
      })
      .collect();

    let author_str = encode_uuid(player_id);
    let at_str     = encode_dt(now);
    let rows: Vec<(String, String)> = facts
      .iter()
      .map(|f| (encode_uuid(f.fact_id), f.text.clone()))
      .collect();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !player_exists(&tx, &author_str)? {
          return Ok(false);
        }
        tx.execute(
          "DELETE FROM facts WHERE author_id = ?1",
          rusqlite::params![author_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO facts (fact_id, author_id, text, created_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (fact_id, text) in &rows {
            stmt.execute(rusqlite::params![fact_id, author_str, text, at_str])?;
          }
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !found {
      return Err(bingo_core::Error::PlayerNotFound(player_id).into());
    }
    Ok(facts)
  }

  async fn list_facts_for_author(&self, player_id: Uuid) -> Result<Vec<Fact>> {
    let id_str = encode_uuid(player_id);

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {FACT_COLUMNS} FROM facts f WHERE f.author_id = ?1 ORDER BY f.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawFact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  async fn list_facts_excluding_self(
    &self,
    player_id: Uuid,
    exclude_solved: bool,
  ) -> Result<Vec<Fact>> {
    let id_str = encode_uuid(player_id);

    let raws: Vec<RawFact> = self
      .conn
      .call(move |conn| {
        // `fact_id IS NOT NULL` keeps orphaned guesses from turning NOT IN
        // into NULL for every row.
        let mut stmt = conn.prepare(&format!(
          "SELECT {FACT_COLUMNS}
           FROM facts f
           WHERE f.author_id != ?1
             AND (?2 = 0 OR f.fact_id NOT IN (
               SELECT g.fact_id FROM guesses g
               WHERE g.guesser_id = ?1
                 AND g.is_correct = 1
                 AND g.fact_id IS NOT NULL
             ))
           ORDER BY f.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, exclude_solved], RawFact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFact::into_fact).collect()
  }

  // ── Guesses ───────────────────────────────────────────────────────────────

  async fn record_guess(&self, guess: NewGuess) -> Result<GuessOutcome> {
    let guess_id_str = encode_uuid(Uuid::new_v4());
    let guesser_str  = encode_uuid(guess.guesser_id);
    let fact_str     = encode_uuid(guess.fact_id);
    let claimed_str  = encode_uuid(guess.claimed_author_id);
    let at_str       = encode_dt(Utc::now());

    let (raw, author, score) = self
      .conn
      .call(move |conn| {
        // Take the write lock before reading; upgrading a read lock later
        // fails without waiting out the busy timeout.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !player_exists(&tx, &guesser_str)? {
          return Ok(Err(bingo_core::Error::PlayerNotFound(guess.guesser_id)));
        }
        if !player_exists(&tx, &claimed_str)? {
          return Ok(Err(bingo_core::Error::PlayerNotFound(guess.claimed_author_id)));
        }

        let author: Option<String> = tx
          .query_row(
            "SELECT author_id FROM facts WHERE fact_id = ?1",
            rusqlite::params![fact_str],
            |r| r.get(0),
          )
          .optional()?;
        let Some(author) = author else {
          return Ok(Err(bingo_core::Error::StaleFact(guess.fact_id)));
        };
        if author == guesser_str {
          return Ok(Err(bingo_core::Error::OwnFact(guess.guesser_id)));
        }

        let is_correct = author == claimed_str;
        tx.execute(
          "INSERT INTO guesses (
             guess_id, guesser_id, fact_id, claimed_author_id, is_correct, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(guesser_id, fact_id) DO UPDATE SET
             claimed_author_id = excluded.claimed_author_id,
             is_correct        = excluded.is_correct,
             created_at        = excluded.created_at
           WHERE guesses.is_correct = 0",
          rusqlite::params![
            guess_id_str,
            guesser_str,
            fact_str,
            claimed_str,
            is_correct,
            at_str,
          ],
        )?;

        let raw = tx.query_row(
          "SELECT guess_id, guesser_id, fact_id, claimed_author_id, is_correct, created_at
           FROM guesses WHERE guesser_id = ?1 AND fact_id = ?2",
          rusqlite::params![guesser_str, fact_str],
          RawGuess::from_row,
        )?;
        let score = correct_count(&tx, &guesser_str)?;
        tx.commit()?;

        Ok(Ok((raw, author, score)))
      })
      .await??;

    Ok(GuessOutcome {
      guess:          raw.into_guess()?,
      true_author_id: decode_uuid(&author)?,
      score:          decode_count(score)?,
    })
  }

  async fn player_score(&self, player_id: Uuid) -> Result<u32> {
    let id_str = encode_uuid(player_id);

    let n = self
      .conn
      .call(move |conn| Ok(correct_count(conn, &id_str)?))
      .await?;
    decode_count(n)
  }

  async fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<ScoreEntry>> {
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws: Vec<RawScore> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT p.player_id, p.name, COALESCE(SUM(g.is_correct), 0) AS score
           FROM players p
           LEFT JOIN guesses g ON g.guesser_id = p.player_id
           GROUP BY p.player_id, p.name
           ORDER BY score DESC, p.name ASC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawScore {
              player_id: row.get(0)?,
              name:      row.get(1)?,
              score:     row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScore::into_entry).collect()
  }

  // ── Winner ────────────────────────────────────────────────────────────────

  async fn claim_winner(&self, player_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(player_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO settings (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value
           WHERE settings.value = ''",
          rusqlite::params![WINNER_KEY, id_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn winner(&self) -> Result<Option<Player>> {
    let raw = self.get_setting(WINNER_KEY, "").await?;
    if raw.is_empty() {
      return Ok(None);
    }
    self.get_player(decode_uuid(&raw)?).await
  }

  // ── Administration ────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<GameStats> {
    let (players, facts, guesses): (i64, i64, i64) = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT (SELECT COUNT(*) FROM players),
                  (SELECT COUNT(*) FROM facts),
                  (SELECT COUNT(*) FROM guesses)",
          [],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(GameStats {
      players: u64::from(decode_count(players)?),
      facts:   u64::from(decode_count(facts)?),
      guesses: u64::from(decode_count(guesses)?),
    })
  }

  async fn reset(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(
          "DELETE FROM guesses;
           DELETE FROM facts;
           DELETE FROM players;
           DELETE FROM settings;",
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
