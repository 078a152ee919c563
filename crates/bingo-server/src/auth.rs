//! Moderator authentication: HTTP Basic auth with the moderator PIN as the
//! password.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use bingo_core::store::GameStore;
use subtle::ConstantTimeEq as _;

use crate::{AppState, error::Error};

/// The only username accepted for moderator requests.
pub const MODERATOR_USERNAME: &str = "moderator";

/// How the moderator PIN is checked.
#[derive(Clone)]
pub enum AuthConfig {
  /// Compared verbatim. The default deployment uses this with a constant.
  Pin(String),
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  PinHash(String),
}

/// Zero-size marker: present in the handler means the moderator PIN checked out.
pub struct Moderator;

/// Verify credentials directly from headers.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, pin) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  if username != MODERATOR_USERNAME {
    return Err(Error::Unauthorized);
  }

  match config {
    AuthConfig::Pin(expected) => {
      if !bool::from(pin.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(Error::Unauthorized);
      }
    }
    AuthConfig::PinHash(hash) => {
      let parsed_hash = PasswordHash::new(hash).map_err(|_| Error::Unauthorized)?;
      Argon2::default()
        .verify_password(pin.as_bytes(), &parsed_hash)
        .map_err(|_| Error::Unauthorized)?;
    }
  }

  Ok(())
}

impl<S> FromRequestParts<AppState<S>> for Moderator
where
  S: GameStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).inspect_err(|_| {
      tracing::warn!(path = %parts.uri.path(), "rejected moderator request");
    })?;
    Ok(Moderator)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{HeaderValue, header};

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  fn basic(user: &str, pin: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pin}"));
    format!("Basic {encoded}")
  }

  fn hashed(pin: &str) -> AuthConfig {
    use argon2::{PasswordHasher, password_hash::SaltString};
    use rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(pin.as_bytes(), &salt)
      .unwrap()
      .to_string();
    AuthConfig::PinHash(hash)
  }

  #[test]
  fn plain_pin_accepted() {
    let cfg = AuthConfig::Pin("3535".into());
    assert!(verify_auth(&headers(&basic("moderator", "3535")), &cfg).is_ok());
  }

  #[test]
  fn wrong_pin_rejected() {
    let cfg = AuthConfig::Pin("3535".into());
    let res = verify_auth(&headers(&basic("moderator", "0000")), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn plain_pin_must_match_exactly() {
    let cfg = AuthConfig::Pin("0123".into());
    assert!(verify_auth(&headers(&basic("moderator", "0123")), &cfg).is_ok());
    for attempt in ["123", "01234", "012", ""] {
      let res = verify_auth(&headers(&basic("moderator", attempt)), &cfg);
      assert!(matches!(res, Err(Error::Unauthorized)), "{attempt:?} accepted");
    }
  }

  #[test]
  fn wrong_username_rejected() {
    let cfg = AuthConfig::Pin("3535".into());
    let res = verify_auth(&headers(&basic("alice", "3535")), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn hashed_pin_accepted_and_rejected() {
    let cfg = hashed("9182");
    assert!(verify_auth(&headers(&basic("moderator", "9182")), &cfg).is_ok());
    let res = verify_auth(&headers(&basic("moderator", "3535")), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let cfg = AuthConfig::Pin("3535".into());
    let res = verify_auth(&HeaderMap::new(), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let cfg = AuthConfig::Pin("3535".into());
    let res = verify_auth(&headers("Basic !!!not-base64!!!"), &cfg);
    assert!(matches!(res, Err(Error::Unauthorized)));
  }
}
