//! Per-participant session records.
//!
//! Each participant has one server-owned [`ParticipantSession`], keyed by
//! player id. Its stage follows the game [`Lifecycle`] and whether the
//! participant has submitted facts; its deck caches the shuffled order in
//! which facts are shown, so repeated page loads stay stable.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::Lifecycle;

/// Where a participant is in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStage {
  /// Registered a name but has no facts on file.
  Joined,
  /// Facts submitted; waiting for the moderator to start.
  Ready,
  /// The game is running.
  Guessing,
  Finished,
}

impl ParticipantStage {
  pub fn resolve(lifecycle: Lifecycle, facts_submitted: bool) -> Self {
    match lifecycle {
      Lifecycle::Registering if facts_submitted => Self::Ready,
      Lifecycle::Registering => Self::Joined,
      Lifecycle::Playing => Self::Guessing,
      Lifecycle::Finished => Self::Finished,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSession {
  pub player_id:       Uuid,
  pub stage:           ParticipantStage,
  pub facts_submitted: bool,
  /// Fact ids in presentation order.
  #[serde(skip)]
  pub deck:            Vec<Uuid>,
  pub last_seen:       DateTime<Utc>,
}

impl ParticipantSession {
  pub fn new(player_id: Uuid) -> Self {
    Self {
      player_id,
      stage: ParticipantStage::Joined,
      facts_submitted: false,
      deck: Vec::new(),
      last_seen: Utc::now(),
    }
  }

  /// Re-resolve the stage. Returns `true` if it changed.
  pub fn sync(&mut self, lifecycle: Lifecycle, facts_submitted: bool) -> bool {
    let next = ParticipantStage::resolve(lifecycle, facts_submitted);
    let changed = next != self.stage;
    self.stage = next;
    self.facts_submitted = facts_submitted;
    self.last_seen = Utc::now();
    changed
  }

  /// Bring the deck in line with the facts currently available to this
  /// participant.
  ///
  /// Facts that are no longer available are dropped, the relative order of
  /// the rest is kept, and newly available facts are appended in random
  /// order.
  pub fn refresh_deck<R>(&mut self, available: &[Uuid], rng: &mut R)
  where
    R: Rng + ?Sized,
  {
    let live: HashSet<Uuid> = available.iter().copied().collect();
    self.deck.retain(|id| live.contains(id));

    let known: HashSet<Uuid> = self.deck.iter().copied().collect();
    let mut fresh: Vec<Uuid> = available
      .iter()
      .copied()
      .filter(|id| !known.contains(id))
      .collect();
    fresh.shuffle(rng);
    self.deck.extend(fresh);
  }

  /// One page of the deck. Pages are 1-based; page 0 is treated as page 1.
  pub fn page(&self, page: usize, per_page: usize) -> &[Uuid] {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= self.deck.len() {
      return &[];
    }
    let end = start.saturating_add(per_page).min(self.deck.len());
    &self.deck[start..end]
  }
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  fn ids(n: usize) -> Vec<Uuid> { (0..n).map(|_| Uuid::new_v4()).collect() }

  #[test]
  fn stage_follows_lifecycle() {
    use ParticipantStage as P;
    assert_eq!(P::resolve(Lifecycle::Registering, false), P::Joined);
    assert_eq!(P::resolve(Lifecycle::Registering, true), P::Ready);
    assert_eq!(P::resolve(Lifecycle::Playing, false), P::Guessing);
    assert_eq!(P::resolve(Lifecycle::Playing, true), P::Guessing);
    assert_eq!(P::resolve(Lifecycle::Finished, true), P::Finished);
  }

  #[test]
  fn pause_returns_guessing_participant_to_ready() {
    let mut s = ParticipantSession::new(Uuid::new_v4());
    assert!(s.sync(Lifecycle::Registering, true));
    assert_eq!(s.stage, ParticipantStage::Ready);
    assert!(s.sync(Lifecycle::Playing, true));
    assert_eq!(s.stage, ParticipantStage::Guessing);
    assert!(s.sync(Lifecycle::Registering, true));
    assert_eq!(s.stage, ParticipantStage::Ready);
    assert!(!s.sync(Lifecycle::Registering, true));
  }

  #[test]
  fn refresh_deck_contains_every_available_fact_once() {
    let mut rng = StdRng::seed_from_u64(7);
    let available = ids(10);
    let mut s = ParticipantSession::new(Uuid::new_v4());
    s.refresh_deck(&available, &mut rng);

    assert_eq!(s.deck.len(), 10);
    let set: HashSet<_> = s.deck.iter().collect();
    assert_eq!(set.len(), 10);
    assert!(available.iter().all(|id| set.contains(id)));
  }

  #[test]
  fn refresh_deck_keeps_existing_order() {
    let mut rng = StdRng::seed_from_u64(42);
    let available = ids(8);
    let mut s = ParticipantSession::new(Uuid::new_v4());
    s.refresh_deck(&available, &mut rng);
    let first = s.deck.clone();

    // Drop one fact and add two new ones.
    let removed = first[3];
    let added = ids(2);
    let mut next: Vec<Uuid> =
      available.iter().copied().filter(|id| *id != removed).collect();
    next.extend(&added);
    s.refresh_deck(&next, &mut rng);

    let expected_prefix: Vec<Uuid> =
      first.iter().copied().filter(|id| *id != removed).collect();
    assert_eq!(&s.deck[..7], expected_prefix.as_slice());
    let tail: HashSet<_> = s.deck[7..].iter().copied().collect();
    let added: HashSet<_> = added.into_iter().collect();
    assert_eq!(tail, added);
  }

  #[test]
  fn page_slices_are_one_based_and_bounded() {
    let mut s = ParticipantSession::new(Uuid::new_v4());
    s.deck = ids(7);

    assert_eq!(s.page(1, 5), &s.deck[0..5]);
    assert_eq!(s.page(0, 5), &s.deck[0..5]);
    assert_eq!(s.page(2, 5), &s.deck[5..7]);
    assert!(s.page(3, 5).is_empty());
  }
}
