use crate::{constants::TOKEN_QUERY_PARAM, error::*};
use http::Request;
use std::sync::Arc;
use tracing::instrument;

/// Validator of the shared access token given in the url query
pub struct TokenValidator {
  access_token: String,
}

impl TokenValidator {
  #[instrument(name = "validate_request", skip_all)]
  /// Validate the `token` query parameter against the configured access token.
  /// An empty parameter is treated as absent.
  pub fn validate_request<B>(&self, req: &Request<B>) -> HttpResult<()> {
    let Some(token) = req.uri().query().and_then(token_from_query) else {
      return Err(HttpError::NoTokenParameter);
    };
    if !constant_time_eq(token.as_bytes(), self.access_token.as_bytes()) {
      return Err(HttpError::InvalidToken);
    }
    Ok(())
  }

  /// Create a new validator
  pub fn new(access_token: &str) -> Arc<Self> {
    Arc::new(Self {
      access_token: access_token.to_string(),
    })
  }
}

/// Retrieve the first non-empty token parameter, percent-decoded
fn token_from_query(query: &str) -> Option<String> {
  url::form_urlencoded::parse(query.as_bytes())
    .find(|(k, _)| k == TOKEN_QUERY_PARAM)
    .map(|(_, v)| v.into_owned())
    .filter(|v| !v.is_empty())
}

/// Byte equality whose running time does not depend on where the inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
  if a.len() != b.len() {
    return false;
  }
  a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
