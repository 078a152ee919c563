//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The request is valid but not in the current game phase.
  #[error("conflict: {0}")]
  Conflict(String),

  /// The client acted on data that has since changed; it should reload.
  #[error("{0}")]
  Stale(String),

  #[error("database busy, retry later")]
  Busy,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<bingo_core::Error> for ApiError {
  fn from(e: bingo_core::Error) -> Self {
    use bingo_core::Error as E;
    match e {
      E::PlayerNotFound(_) => ApiError::NotFound(e.to_string()),
      E::StaleFact(_) => ApiError::Stale(e.to_string()),
      E::OwnFact(_) | E::BlankName => ApiError::BadRequest(e.to_string()),
      E::InvalidTransition(_) => ApiError::Conflict(e.to_string()),
      E::Busy => ApiError::Busy,
      E::Storage(inner) => ApiError::Store(inner),
    }
  }
}

/// Convert any backend error into an [`ApiError`]; for use with `map_err`.
pub fn store_err<E: Into<bingo_core::Error>>(e: E) -> ApiError {
  ApiError::from(e.into())
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) | ApiError::Stale(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Busy => {
        tracing::warn!("database busy; asking client to retry");
        (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
