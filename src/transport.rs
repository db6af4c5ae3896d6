//! Network transport boundary: a request-descriptor trait plus the default
//! reqwest-backed implementation with normalized errors.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
  Get,
  Post,
  Put,
  Delete,
}

impl HttpMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      HttpMethod::Get => "GET",
      HttpMethod::Post => "POST",
      HttpMethod::Put => "PUT",
      HttpMethod::Delete => "DELETE",
    }
  }
}

/// A transport-agnostic request: method, url, query params and/or body.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
  pub method: HttpMethod,
  pub url: String,
  pub params: Option<Map<String, Value>>,
  pub body: Option<Value>,
}

impl RequestDescriptor {
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: HttpMethod::Get,
      url: url.into(),
      params: None,
      body: None,
    }
  }

  pub fn post(url: impl Into<String>, body: Value) -> Self {
    Self {
      method: HttpMethod::Post,
      url: url.into(),
      params: None,
      body: Some(body),
    }
  }

  pub fn put(url: impl Into<String>, body: Value) -> Self {
    Self {
      method: HttpMethod::Put,
      url: url.into(),
      params: None,
      body: Some(body),
    }
  }

  pub fn delete(url: impl Into<String>) -> Self {
    Self {
      method: HttpMethod::Delete,
      url: url.into(),
      params: None,
      body: None,
    }
  }

  pub fn with_params(mut self, params: Map<String, Value>) -> Self {
    if !params.is_empty() {
      self.params = Some(params);
    }
    self
  }
}

/// The network collaborator. Resolves a request to an optional JSON body
/// (delete endpoints legitimately return nothing) or a normalized error.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn request(&self, request: RequestDescriptor) -> Result<Option<Value>, TransportError>;
}

/// Default transport over reqwest.
///
/// Joins descriptor urls onto a base url, encodes query params in the
/// `key[]=` array convention and normalizes every failure into
/// [`TransportError`]; transport errors are values here, never panics.
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
  base_url: String,
}

impl HttpTransport {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      client: reqwest::Client::new(),
      base_url: base_url.into(),
    }
  }

  /// Use a preconfigured client (auth headers, proxies, timeouts).
  pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
    Self {
      client,
      base_url: base_url.into(),
    }
  }

  fn absolute_url(&self, url: &str) -> String {
    format!(
      "{}/{}",
      self.base_url.trim_end_matches('/'),
      url.trim_start_matches('/')
    )
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn request(&self, request: RequestDescriptor) -> Result<Option<Value>, TransportError> {
    let url = self.absolute_url(&request.url);
    debug!(method = request.method.as_str(), %url, "dispatching request");

    let mut builder = match request.method {
      HttpMethod::Get => self.client.get(&url),
      HttpMethod::Post => self.client.post(&url),
      HttpMethod::Put => self.client.put(&url),
      HttpMethod::Delete => self.client.delete(&url),
    };

    if let Some(params) = &request.params {
      builder = builder.query(&query_pairs(params));
    }
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder
      .send()
      .await
      .map_err(|e| TransportError::network(e.to_string()))?;

    let status = response.status().as_u16();
    let text = response
      .text()
      .await
      .map_err(|e| TransportError::network(e.to_string()))?;
    let body: Option<Value> = if text.is_empty() {
      None
    } else {
      serde_json::from_str(&text).ok()
    };

    if (200..300).contains(&status) {
      Ok(body)
    } else {
      Err(TransportError::from_response(status, body))
    }
  }
}

/// Flatten a JSON object into query pairs. Arrays expand to repeated
/// `key[]` entries; scalars use their plain string form.
fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
  let mut pairs = Vec::new();
  for (key, value) in params {
    match value {
      Value::Array(items) => {
        for item in items {
          pairs.push((format!("{key}[]"), scalar_string(item)));
        }
      }
      Value::Null => {}
      other => pairs.push((key.clone(), scalar_string(other))),
    }
  }
  pairs
}

fn scalar_string(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// Scripted transport for tests: pops queued responses in order and records
/// every request it saw.
#[cfg(test)]
pub(crate) mod mock {
  use super::*;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Option<Value>, TransportError>>>,
    pub requests: Mutex<Vec<RequestDescriptor>>,
  }

  impl MockTransport {
    pub fn new() -> Self {
      Self {
        responses: Mutex::new(VecDeque::new()),
        requests: Mutex::new(Vec::new()),
      }
    }

    pub fn push_ok(&self, body: Value) {
      self.responses.lock().unwrap().push_back(Ok(Some(body)));
    }

    pub fn push_empty(&self) {
      self.responses.lock().unwrap().push_back(Ok(None));
    }

    pub fn push_err(&self, code: &str, message: &str) {
      self
        .responses
        .lock()
        .unwrap()
        .push_back(Err(TransportError::new(
          Some(code.to_string()),
          message,
          None,
        )));
    }

    pub fn seen(&self) -> Vec<RequestDescriptor> {
      self.requests.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl Transport for MockTransport {
    async fn request(&self, request: RequestDescriptor) -> Result<Option<Value>, TransportError> {
      self.requests.lock().unwrap().push(request);
      self
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .expect("MockTransport ran out of scripted responses")
    }
  }
}
