//! SQL schema for the bingo SQLite store.
//!
//! Executed once per connection at startup. Future migrations will be gated
//! on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Process-wide flags: started, finished, winner_id.
CREATE TABLE IF NOT EXISTS settings (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS players (
    player_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,   -- case-sensitive, trimmed
    created_at  TEXT NOT NULL
);

-- Replaced wholesale per author; never edited in place.
CREATE TABLE IF NOT EXISTS facts (
    fact_id     TEXT PRIMARY KEY,
    author_id   TEXT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
    text        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Correctness is fixed at write time. A guess outlives its fact with
-- fact_id set to NULL so scores never drift.
CREATE TABLE IF NOT EXISTS guesses (
    guess_id           TEXT PRIMARY KEY,
    guesser_id         TEXT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
    fact_id            TEXT REFERENCES facts(fact_id) ON DELETE SET NULL,
    claimed_author_id  TEXT NOT NULL REFERENCES players(player_id) ON DELETE CASCADE,
    is_correct         INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
    created_at         TEXT NOT NULL,
    UNIQUE (guesser_id, fact_id)
);

CREATE INDEX IF NOT EXISTS facts_author_idx    ON facts(author_id);
CREATE INDEX IF NOT EXISTS guesses_guesser_idx ON guesses(guesser_id);
CREATE INDEX IF NOT EXISTS guesses_fact_idx    ON guesses(fact_id);

PRAGMA user_version = 1;
";
