//! Server-side registry of participant sessions.

use bingo_core::{
  lifecycle::Lifecycle,
  session::{ParticipantSession, ParticipantStage},
};
use dashmap::DashMap;
use uuid::Uuid;

/// All participant sessions known to this process, keyed by player id.
///
/// Entries are created lazily the first time a participant is seen and are
/// dropped only by [`SessionRegistry::clear`] (on game reset).
#[derive(Debug, Default)]
pub struct SessionRegistry {
  sessions: DashMap<Uuid, ParticipantSession>,
}

/// One page of a participant's deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSlice {
  pub fact_ids: Vec<Uuid>,
  /// Size of the whole deck, across all pages.
  pub total:    usize,
}

impl SessionRegistry {
  pub fn new() -> Self { Self::default() }

  /// Create the session if needed and re-resolve its stage.
  pub fn touch(
    &self,
    player_id: Uuid,
    lifecycle: Lifecycle,
    facts_submitted: bool,
  ) -> ParticipantSession {
    let mut entry = self
      .sessions
      .entry(player_id)
      .or_insert_with(|| ParticipantSession::new(player_id));
    let before: ParticipantStage = entry.stage;
    if entry.sync(lifecycle, facts_submitted) {
      tracing::debug!(%player_id, from = ?before, to = ?entry.stage, "participant stage changed");
    }
    entry.clone()
  }

  /// Refresh the participant's cached deck against `available` and return
  /// the requested page.
  pub fn deck_page(
    &self,
    player_id: Uuid,
    available: &[Uuid],
    page: usize,
    per_page: usize,
  ) -> DeckSlice {
    let mut entry = self
      .sessions
      .entry(player_id)
      .or_insert_with(|| ParticipantSession::new(player_id));
    entry.refresh_deck(available, &mut rand::rng());
    DeckSlice {
      fact_ids: entry.page(page, per_page).to_vec(),
      total:    entry.deck.len(),
    }
  }

  pub fn get(&self, player_id: Uuid) -> Option<ParticipantSession> {
    self.sessions.get(&player_id).map(|s| s.clone())
  }

  pub fn len(&self) -> usize { self.sessions.len() }

  pub fn is_empty(&self) -> bool { self.sessions.is_empty() }

  /// Forget every session.
  pub fn clear(&self) { self.sessions.clear(); }
}
