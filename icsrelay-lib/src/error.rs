use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong in the relay service as a whole
#[derive(Debug, Error)]
pub enum RelayError {
  #[error("Failed to bind TCP socket")]
  BindTcpSocketError(#[from] std::io::Error),
  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),
  #[error("Failed to fetch calendar: {0}")]
  FetchError(#[from] HttpError),
  #[error("Failed to write calendar to {path}: {source}")]
  WriteFileError { path: String, source: std::io::Error },
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

/// Describes things that can go wrong while serving a single request
#[derive(Debug, Error)]
pub enum HttpError {
  #[error("Not Found")]
  NotFound,

  #[error("Token parameter required")]
  NoTokenParameter,
  #[error("Invalid token")]
  InvalidToken,

  #[error("Failed to send request to upstream: {0}")]
  UpstreamRequest(#[from] hyper_util::client::legacy::Error),
  #[error("Upstream returned error status: {status}, body: {body}")]
  UpstreamStatus { status: u16, body: String },
  #[error("Failed to read upstream response body: {0}")]
  UpstreamBody(String),
  #[error("Upstream redirect error: {0}")]
  UpstreamRedirect(String),
  #[error("Upstream timeout")]
  UpstreamTimeout,

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<&HttpError> for StatusCode {
  fn from(e: &HttpError) -> StatusCode {
    match e {
      HttpError::NotFound => StatusCode::NOT_FOUND,
      HttpError::NoTokenParameter => StatusCode::UNAUTHORIZED,
      HttpError::InvalidToken => StatusCode::UNAUTHORIZED,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_code_mapping() {
    assert_eq!(StatusCode::from(&HttpError::NotFound), StatusCode::NOT_FOUND);
    assert_eq!(StatusCode::from(&HttpError::NoTokenParameter), StatusCode::UNAUTHORIZED);
    assert_eq!(StatusCode::from(&HttpError::InvalidToken), StatusCode::UNAUTHORIZED);
    assert_eq!(StatusCode::from(&HttpError::UpstreamTimeout), StatusCode::INTERNAL_SERVER_ERROR);
    let e = HttpError::UpstreamStatus {
      status: 500,
      body: "Server Error".to_string(),
    };
    assert_eq!(StatusCode::from(&e), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(e.to_string(), "Upstream returned error status: 500, body: Server Error");
  }
}
