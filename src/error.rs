//! Error types surfaced by entity APIs.

use serde_json::Value;
use thiserror::Error;

/// A transport-level failure normalized to a `{code, message, data}` shape.
///
/// Whatever the underlying HTTP client reports (connection refused, 4xx/5xx
/// response, malformed body) ends up here so the cache layer never has to
/// understand transport internals.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("transport error{}: {message}", code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct TransportError {
  /// Status code or client-defined error code, when one exists.
  pub code: Option<String>,
  /// Human-readable message.
  pub message: String,
  /// Raw error payload returned by the server, if any.
  pub data: Option<Value>,
}

impl TransportError {
  pub fn new(code: Option<String>, message: impl Into<String>, data: Option<Value>) -> Self {
    Self {
      code,
      message: message.into(),
      data,
    }
  }

  /// A failure that never reached the server (DNS, connect, timeout).
  pub fn network(message: impl Into<String>) -> Self {
    Self {
      code: None,
      message: message.into(),
      data: None,
    }
  }

  /// Normalize a non-success HTTP response. The message is taken from the
  /// body's `message` or `error` field when present, mirroring common
  /// REST error envelopes.
  pub fn from_response(status: u16, body: Option<Value>) -> Self {
    let message = body
      .as_ref()
      .and_then(|b| {
        b.get("message")
          .or_else(|| b.get("error"))
          .and_then(Value::as_str)
          .map(String::from)
      })
      .unwrap_or_else(|| format!("request failed with status {status}"));

    Self {
      code: Some(status.to_string()),
      message,
      data: body,
    }
  }
}

/// Errors produced by entity API operations.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or inconsistent construction parameters. Raised at build time.
  #[error("invalid entity api configuration: {0}")]
  Config(String),

  /// The mutation was handed a patch without an entity id.
  #[error("mutation requires an entity id")]
  MissingId,

  /// Normalized transport failure. Never aborts sibling view patches.
  #[error(transparent)]
  Transport(#[from] TransportError),

  /// The server payload did not decode into the expected entity shape.
  #[error("failed to decode entity payload: {0}")]
  Decode(#[from] serde_json::Error),

  /// The server returned no body where one was required.
  #[error("expected a response body for {0}")]
  EmptyResponse(&'static str),
}
