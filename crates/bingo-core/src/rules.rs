//! Tunable game rules.

use std::time::Duration;

/// Rules shared by the participant API and the moderator routes.
#[derive(Debug, Clone)]
pub struct GameRules {
  /// A fact submission must contain exactly this many non-blank facts.
  pub facts_per_player: usize,
  /// The first participant to reach this score is recorded as the winner.
  pub win_target:       u32,
  /// Deck page size when the client does not ask for one.
  pub page_size:        usize,
  pub max_page_size:    usize,
  /// Delay between store reads while long-polling for the game to start.
  pub poll_interval:    Duration,
}

impl Default for GameRules {
  fn default() -> Self {
    Self {
      facts_per_player: 5,
      win_target:       5,
      page_size:        5,
      max_page_size:    50,
      poll_interval:    Duration::from_secs(2),
    }
  }
}
