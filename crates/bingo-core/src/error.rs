//! Error types for `bingo-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::InvalidTransition;

/// Domain-level failures shared by every store backend and the HTTP layers.
///
/// Backends convert their own error types into this one so callers can
/// classify failures without knowing which backend produced them.
#[derive(Debug, Error)]
pub enum Error {
  #[error("player not found: {0}")]
  PlayerNotFound(Uuid),

  /// The fact was deleted (usually by its author replacing their facts)
  /// after the caller last loaded it.
  #[error("fact {0} no longer exists; stale state, reload")]
  StaleFact(Uuid),

  #[error("player {0} cannot guess their own fact")]
  OwnFact(Uuid),

  #[error("player name must not be blank")]
  BlankName,

  /// The database stayed locked past the busy timeout.
  #[error("database busy, retry later")]
  Busy,

  #[error(transparent)]
  InvalidTransition(#[from] InvalidTransition),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
