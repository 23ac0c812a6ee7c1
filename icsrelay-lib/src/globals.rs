use crate::{constants::*, count::ConnectionCount, error::*};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use url::Url;

/// Global objects
pub struct Globals {
  /// Configuration of the relay service
  pub service_config: ServiceConfig,

  /// Tokio runtime handler
  pub runtime_handle: tokio::runtime::Handle,

  /// Tokio termination notifier
  pub term_notify: Option<Arc<tokio::sync::Notify>>,

  /// In-flight connection count
  pub connection_count: ConnectionCount,
}

#[derive(Clone, Debug)]
/// Service configuration passed from outside, immutable once the service starts
pub struct ServiceConfig {
  /// Address to listen on
  pub listener_socket: SocketAddr,

  /// TCP listen backlog
  pub tcp_listen_backlog: u32,

  /// Maximum number of concurrent connections
  pub max_clients: usize,
  /// Maximum number of concurrent streams
  pub max_concurrent_streams: u32,
  /// http keepalive
  pub keepalive: bool,
  /// timeout for serving a connection
  pub timeout: Duration,

  /// relay config
  pub relay: RelayConfig,
}

#[derive(Clone, Debug)]
/// Relay configuration
pub struct RelayConfig {
  /// url path serving the relayed calendar
  pub calendar_path: String,
  /// url path of the health check
  pub health_path: String,
  /// Shared secret expected in the token query parameter. If None, the calendar is served without authentication.
  pub access_token: Option<String>,
  /// upstream calendar source
  pub upstream: UpstreamConfig,
}

#[derive(Clone, Debug)]
/// Upstream calendar source
pub struct UpstreamConfig {
  /// absolute http(s) url of the calendar file
  pub url: Url,
  /// user agent presented to the upstream
  pub user_agent: String,
  /// timeout for the whole upstream fetch
  pub timeout: Duration,
}

impl ServiceConfig {
  /// Build a service config listening on the default socket
  pub fn new(relay: RelayConfig) -> Self {
    Self {
      listener_socket: SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
      tcp_listen_backlog: TCP_LISTEN_BACKLOG,
      max_clients: MAX_CLIENTS,
      max_concurrent_streams: MAX_CONCURRENT_STREAMS,
      keepalive: KEEPALIVE,
      timeout: Duration::from_secs(TIMEOUT),
      relay,
    }
  }
}

impl RelayConfig {
  /// Build a relay config with default paths.
  /// An access token, if given, must not be empty.
  pub fn try_new(upstream: UpstreamConfig, access_token: Option<String>) -> Result<Self> {
    if matches!(&access_token, Some(t) if t.is_empty()) {
      return Err(RelayError::InvalidConfig("access token must not be empty".to_string()));
    }
    Ok(Self {
      calendar_path: CALENDAR_PATH.to_string(),
      health_path: HEALTH_PATH.to_string(),
      access_token,
      upstream,
    })
  }
}

impl UpstreamConfig {
  /// Parse and check the upstream url. Only absolute http and https urls with a host are accepted.
  pub fn try_new(url: &str) -> Result<Self> {
    let url = Url::parse(url).map_err(|e| RelayError::InvalidConfig(format!("invalid upstream url {url}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
      return Err(RelayError::InvalidConfig(format!(
        "upstream url must be an absolute http(s) url: {url}"
      )));
    }
    Ok(Self {
      url,
      user_agent: BROWSER_USER_AGENT.to_string(),
      timeout: Duration::from_secs(UPSTREAM_TIMEOUT_SEC),
    })
  }

  /// Replace the user agent presented to the upstream. It must be a non-empty valid header value.
  pub fn with_user_agent(mut self, user_agent: &str) -> Result<Self> {
    if user_agent.is_empty() || http::HeaderValue::from_str(user_agent).is_err() {
      return Err(RelayError::InvalidConfig(format!("invalid user agent: {user_agent:?}")));
    }
    self.user_agent = user_agent.to_string();
    Ok(self)
  }

  /// Scheme, host and port of the upstream. Published calendar urls often embed a secret in the path or query,
  /// so only this part goes to logs.
  pub fn origin(&self) -> String {
    self.url.origin().ascii_serialization()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn upstream_url_must_be_absolute_http() {
    let upstream = UpstreamConfig::try_new("https://example.test/cal.ics").unwrap();
    assert_eq!(upstream.url.as_str(), "https://example.test/cal.ics");
    assert_eq!(upstream.user_agent, BROWSER_USER_AGENT);
    assert_eq!(upstream.timeout, Duration::from_secs(UPSTREAM_TIMEOUT_SEC));

    assert!(UpstreamConfig::try_new("http://127.0.0.1:8080/a.ics").is_ok());
    assert!(UpstreamConfig::try_new("example.test/cal.ics").is_err());
    assert!(UpstreamConfig::try_new("/cal.ics").is_err());
    assert!(UpstreamConfig::try_new("ftp://example.test/cal.ics").is_err());
    assert!(UpstreamConfig::try_new("").is_err());
  }

  #[test]
  fn origin_hides_path_and_query() {
    let upstream = UpstreamConfig::try_new("https://example.test/private/5f3c9a/basic.ics?key=s3cr3t").unwrap();
    assert_eq!(upstream.origin(), "https://example.test");
    let upstream = UpstreamConfig::try_new("http://127.0.0.1:8080/cal.ics").unwrap();
    assert_eq!(upstream.origin(), "http://127.0.0.1:8080");
  }

  #[test]
  fn user_agent_must_be_header_value() {
    let upstream = UpstreamConfig::try_new("https://example.test/cal.ics").unwrap();
    let upstream = upstream.with_user_agent("Mozilla/5.0 (X11; Linux x86_64)").unwrap();
    assert_eq!(upstream.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
    assert!(upstream.clone().with_user_agent("").is_err());
    assert!(upstream.with_user_agent("bad\nagent").is_err());
  }

  #[test]
  fn access_token_must_not_be_empty() {
    let upstream = UpstreamConfig::try_new("https://example.test/cal.ics").unwrap();
    assert!(RelayConfig::try_new(upstream.clone(), Some(String::new())).is_err());
    assert!(RelayConfig::try_new(upstream.clone(), None).is_ok());

    let relay = RelayConfig::try_new(upstream, Some("secret123".to_string())).unwrap();
    assert_eq!(relay.calendar_path, CALENDAR_PATH);
    assert_eq!(relay.health_path, HEALTH_PATH);

    let service = ServiceConfig::new(relay);
    assert_eq!(service.listener_socket.to_string(), "0.0.0.0:8000");
  }
}
