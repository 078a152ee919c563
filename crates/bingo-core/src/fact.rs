//! Facts and guesses.
//!
//! A fact is a short personal statement owned by its author. A guess is one
//! player's claim about who authored somebody else's fact. Correctness is
//! decided when the guess is written and stored with it, so later changes to
//! the fact table never rewrite historical scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Fact ────────────────────────────────────────────────────────────────────

/// A submitted personal statement attributed to its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
  pub fact_id:    Uuid,
  pub author_id:  Uuid,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

/// A fact as shown to someone who is trying to guess its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenFact {
  pub fact_id: Uuid,
  pub text:    String,
}

impl From<Fact> for HiddenFact {
  fn from(f: Fact) -> Self {
    Self { fact_id: f.fact_id, text: f.text }
  }
}

/// Trim every entry and drop the blank ones.
pub fn clean_fact_texts<I, S>(texts: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  texts
    .into_iter()
    .map(|t| t.as_ref().trim().to_owned())
    .filter(|t| !t.is_empty())
    .collect()
}

// ─── Guess ───────────────────────────────────────────────────────────────────

/// Input to [`crate::store::GameStore::record_guess`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGuess {
  pub guesser_id:        Uuid,
  pub fact_id:           Uuid,
  pub claimed_author_id: Uuid,
}

/// A stored guess. At most one exists per `(guesser_id, fact_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
  pub guess_id:          Uuid,
  pub guesser_id:        Uuid,
  /// `None` once the fact has been deleted; the guess keeps its score.
  pub fact_id:           Option<Uuid>,
  pub claimed_author_id: Uuid,
  pub is_correct:        bool,
  pub created_at:        DateTime<Utc>,
}

/// What [`crate::store::GameStore::record_guess`] reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessOutcome {
  /// The row as it stands after the write. A guess that was already correct
  /// is never overwritten, so this may differ from the submitted claim.
  pub guess:          Guess,
  pub true_author_id: Uuid,
  /// The guesser's score after the write.
  pub score:          u32,
}

impl GuessOutcome {
  pub fn is_correct(&self) -> bool { self.guess.is_correct }
}
