//! The game lifecycle state machine.
//!
//! The lifecycle is persisted as two string-encoded boolean settings,
//! `started` and `finished`, so that every process sharing the database sees
//! the same phase. In memory it is always handled as a [`Lifecycle`] value and
//! changed only through [`Lifecycle::apply`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Setting keys ────────────────────────────────────────────────────────────

pub const STARTED_KEY: &str = "started";
pub const FINISHED_KEY: &str = "finished";
/// Player id of the first participant to reach the win target.
pub const WINNER_KEY: &str = "winner_id";

pub fn encode_flag(value: bool) -> &'static str {
  if value { "1" } else { "0" }
}

/// Absent or unrecognised values read as `false`.
pub fn decode_flag(value: &str) -> bool {
  matches!(value.trim(), "1" | "true")
}

// ─── State ───────────────────────────────────────────────────────────────────

/// The phase the whole game is in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
  /// Participants join and submit their facts.
  #[default]
  Registering,
  /// Participants guess who wrote which fact.
  Playing,
  /// Play is over; only the moderator's reset leaves this state.
  Finished,
}

impl Lifecycle {
  /// Decode from the persisted `(started, finished)` flags.
  pub fn from_flags(started: bool, finished: bool) -> Self {
    match (started, finished) {
      (_, true) => Self::Finished,
      (true, false) => Self::Playing,
      (false, false) => Self::Registering,
    }
  }

  /// The `(started, finished)` flags to persist for this state.
  pub fn flags(self) -> (bool, bool) {
    match self {
      Self::Registering => (false, false),
      Self::Playing => (true, false),
      Self::Finished => (true, true),
    }
  }

  /// Compute the state reached by applying `event`, or reject it.
  pub fn apply(self, event: LifecycleEvent) -> Result<Self, InvalidTransition> {
    use LifecycleEvent as E;
    match (self, event) {
      (_, E::Reset) => Ok(Self::Registering),
      (Self::Registering, E::Start) => Ok(Self::Playing),
      (Self::Playing, E::Pause) => Ok(Self::Registering),
      (Self::Playing, E::Finish) => Ok(Self::Finished),
      (from, event) => Err(InvalidTransition { from, event }),
    }
  }

  pub fn accepts_facts(self) -> bool { self == Self::Registering }

  pub fn accepts_guesses(self) -> bool { self == Self::Playing }
}

impl fmt::Display for Lifecycle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Registering => "registering",
      Self::Playing => "playing",
      Self::Finished => "finished",
    })
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Moderator actions that move the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
  Start,
  /// Back to registration without losing any data.
  Pause,
  Finish,
  /// Wipe every table and return to registration.
  Reset,
}

impl fmt::Display for LifecycleEvent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Start => "start",
      Self::Pause => "pause",
      Self::Finish => "finish",
      Self::Reset => "reset",
    })
  }
}

/// Returned when an event cannot be applied in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {event} while the game is {from}")]
pub struct InvalidTransition {
  pub from:  Lifecycle,
  pub event: LifecycleEvent,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_roundtrip_for_every_state() {
    for state in [Lifecycle::Registering, Lifecycle::Playing, Lifecycle::Finished] {
      let (started, finished) = state.flags();
      assert_eq!(Lifecycle::from_flags(started, finished), state);
    }
  }

  #[test]
  fn finished_flag_wins_over_started() {
    assert_eq!(Lifecycle::from_flags(false, true), Lifecycle::Finished);
  }

  #[test]
  fn flag_decoding() {
    assert!(decode_flag("1"));
    assert!(decode_flag("true"));
    assert!(!decode_flag("0"));
    assert!(!decode_flag(""));
    assert_eq!(encode_flag(true), "1");
    assert_eq!(encode_flag(false), "0");
  }

  #[test]
  fn happy_path_transitions() {
    let s = Lifecycle::default();
    let s = s.apply(LifecycleEvent::Start).unwrap();
    assert_eq!(s, Lifecycle::Playing);
    let s = s.apply(LifecycleEvent::Pause).unwrap();
    assert_eq!(s, Lifecycle::Registering);
    let s = s.apply(LifecycleEvent::Start).unwrap();
    let s = s.apply(LifecycleEvent::Finish).unwrap();
    assert_eq!(s, Lifecycle::Finished);
  }

  #[test]
  fn reset_is_accepted_from_every_state() {
    for state in [Lifecycle::Registering, Lifecycle::Playing, Lifecycle::Finished] {
      assert_eq!(state.apply(LifecycleEvent::Reset).unwrap(), Lifecycle::Registering);
    }
  }

  #[test]
  fn invalid_transitions_are_rejected() {
    let cases = [
      (Lifecycle::Registering, LifecycleEvent::Pause),
      (Lifecycle::Registering, LifecycleEvent::Finish),
      (Lifecycle::Playing, LifecycleEvent::Start),
      (Lifecycle::Finished, LifecycleEvent::Start),
      (Lifecycle::Finished, LifecycleEvent::Pause),
      (Lifecycle::Finished, LifecycleEvent::Finish),
    ];
    for (from, event) in cases {
      let err = from.apply(event).unwrap_err();
      assert_eq!(err, InvalidTransition { from, event });
    }
  }

  #[test]
  fn invalid_transition_message() {
    let err = Lifecycle::Finished.apply(LifecycleEvent::Start).unwrap_err();
    assert_eq!(err.to_string(), "cannot start while the game is finished");
  }

  #[test]
  fn phase_gates() {
    assert!(Lifecycle::Registering.accepts_facts());
    assert!(!Lifecycle::Playing.accepts_facts());
    assert!(Lifecycle::Playing.accepts_guesses());
    assert!(!Lifecycle::Finished.accepts_guesses());
  }
}
