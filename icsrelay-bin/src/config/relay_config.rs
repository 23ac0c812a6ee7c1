use super::{parse::ConfigOverrides, toml::ConfigToml};
use crate::{constants::CONNECTION_TIMEOUT_MARGIN_SECS, error::*, trace::*};
use async_trait::async_trait;
use hot_reload::{Reload, ReloaderError};
use ics_relay_lib::{RelayConfig, ServiceConfig, UpstreamConfig};
use std::time::Duration;

#[derive(PartialEq, Eq, Clone, Debug)]
/// Wrapper of config toml and the values overriding it
pub struct AppConfig {
  /// config toml, empty if no config file is given
  pub config_toml: ConfigToml,
  /// command line and environment variable values
  pub overrides: ConfigOverrides,
}

#[derive(Clone)]
/// Source of the reloaded config
pub struct ConfigSource {
  pub config_path: String,
  pub overrides: ConfigOverrides,
}

#[derive(Clone)]
/// config toml reloader
pub struct ConfigReloader {
  pub source: ConfigSource,
}

#[async_trait]
impl Reload<AppConfig> for ConfigReloader {
  type Source = ConfigSource;
  async fn new(source: &Self::Source) -> Result<Self, ReloaderError<AppConfig>> {
    Ok(Self { source: source.clone() })
  }

  async fn reload(&self) -> Result<Option<AppConfig>, ReloaderError<AppConfig>> {
    let config_toml = ConfigToml::new(&self.source.config_path)
      .map_err(|_e| ReloaderError::<AppConfig>::Reload("Failed to reload config toml"))?;

    Ok(Some(AppConfig {
      config_toml,
      overrides: self.source.overrides.clone(),
    }))
  }
}

impl AppConfig {
  /// build app config from an optional config file and overrides
  pub fn new(config_file: Option<&str>, overrides: &ConfigOverrides) -> anyhow::Result<Self> {
    let config_toml = match config_file {
      Some(path) => ConfigToml::new(path)?,
      None => ConfigToml::default(),
    };
    Ok(Self {
      config_toml,
      overrides: overrides.clone(),
    })
  }
}

impl TryInto<ServiceConfig> for &AppConfig {
  type Error = anyhow::Error;

  fn try_into(self) -> Result<ServiceConfig, Self::Error> {
    let relay_toml = self.config_toml.relay.clone().unwrap_or_default();

    // upstream
    let Some(ics_url) = self.overrides.ics_url.as_ref().or(relay_toml.ics_url.as_ref()) else {
      bail!("Upstream calendar url is required: set ICS_URL or relay.ics_url");
    };
    let mut upstream = UpstreamConfig::try_new(ics_url)?;
    if let Some(user_agent) = &relay_toml.user_agent {
      upstream = upstream.with_user_agent(user_agent)?;
    }
    if let Some(timeout) = relay_toml.upstream_timeout_sec {
      ensure!(timeout > 0, "Upstream timeout must be positive");
      upstream.timeout = Duration::from_secs(timeout);
    }
    info!("Upstream calendar: {}", upstream.origin());
    debug!("Upstream calendar url: {}", upstream.url);
    info!("Upstream user agent: {}", upstream.user_agent);
    info!("Upstream timeout: {} secs", upstream.timeout.as_secs());

    // authentication
    let access_token = if self.overrides.no_auth {
      warn!("Token authentication is disabled");
      None
    } else {
      let token = self
        .overrides
        .access_token
        .as_ref()
        .or(relay_toml.access_token.as_ref())
        .filter(|t| !t.is_empty());
      let Some(token) = token else {
        bail!("Access token is required: set ACCESS_TOKEN or relay.access_token, or pass --no-auth");
      };
      info!("Token authentication is enabled");
      Some(token.clone())
    };

    let mut relay = RelayConfig::try_new(upstream, access_token)?;
    if let Some(path) = &relay_toml.calendar_path {
      relay.calendar_path = path.clone();
    }
    if let Some(path) = &relay_toml.health_path {
      relay.health_path = path.clone();
    }
    ensure!(
      relay.calendar_path.starts_with('/') && relay.health_path.starts_with('/'),
      "Serving paths must start with '/'"
    );
    ensure!(
      relay.calendar_path != relay.health_path,
      "Calendar path and health path must differ"
    );
    info!("Calendar path: {}", relay.calendar_path);
    info!("Health path: {}", relay.health_path);

    // listener
    let upstream_timeout = relay.upstream.timeout;
    let mut service_conf = ServiceConfig::new(relay);
    if let Some(addr) = &self.config_toml.listen_address {
      let addr = addr.parse::<std::net::IpAddr>()?;
      service_conf.listener_socket.set_ip(addr);
    }
    if let Some(port) = self.overrides.listen_port.or(self.config_toml.listen_port) {
      ensure!(port > 0, "Listen port must be positive");
      service_conf.listener_socket.set_port(port);
    }
    info!("Listening on {}", service_conf.listener_socket);

    // a connection must outlive the upstream fetch it is waiting for
    let min_timeout = upstream_timeout + Duration::from_secs(CONNECTION_TIMEOUT_MARGIN_SECS);
    if service_conf.timeout < min_timeout {
      service_conf.timeout = min_timeout;
    }

    Ok(service_conf)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::toml::Relay;

  fn overrides(ics_url: Option<&str>, access_token: Option<&str>) -> ConfigOverrides {
    ConfigOverrides {
      ics_url: ics_url.map(|s| s.to_string()),
      access_token: access_token.map(|s| s.to_string()),
      ..Default::default()
    }
  }

  fn build(config_toml: ConfigToml, overrides: ConfigOverrides) -> anyhow::Result<ServiceConfig> {
    let app_config = AppConfig { config_toml, overrides };
    (&app_config).try_into()
  }

  #[test]
  fn minimal_env_config() {
    let conf = build(
      ConfigToml::default(),
      overrides(Some("https://example.test/cal.ics"), Some("secret123")),
    )
    .unwrap();
    assert_eq!(conf.listener_socket.to_string(), "0.0.0.0:8000");
    assert_eq!(conf.relay.upstream.url.as_str(), "https://example.test/cal.ics");
    assert_eq!(conf.relay.access_token.as_deref(), Some("secret123"));
    assert_eq!(conf.relay.calendar_path, "/calendar.ics");
    assert_eq!(conf.relay.health_path, "/health");
    assert!(conf.timeout > conf.relay.upstream.timeout);
  }

  #[test]
  fn missing_required_values_are_fatal() {
    assert!(build(ConfigToml::default(), overrides(None, Some("secret123"))).is_err());
    assert!(build(
      ConfigToml::default(),
      overrides(Some("https://example.test/cal.ics"), None)
    )
    .is_err());
    assert!(build(
      ConfigToml::default(),
      overrides(Some("https://example.test/cal.ics"), Some(""))
    )
    .is_err());
    assert!(build(ConfigToml::default(), overrides(Some("not a url"), Some("secret123"))).is_err());
  }

  #[test]
  fn no_auth_variant() {
    let mut o = overrides(Some("https://example.test/cal.ics"), Some("ignored"));
    o.no_auth = true;
    let conf = build(ConfigToml::default(), o).unwrap();
    assert!(conf.relay.access_token.is_none());
  }

  #[test]
  fn overrides_take_precedence_over_file() {
    let config_toml = ConfigToml {
      listen_address: Some("127.0.0.1".to_string()),
      listen_port: Some(8080),
      relay: Some(Relay {
        ics_url: Some("https://file.test/cal.ics".to_string()),
        access_token: Some("from-file".to_string()),
        calendar_path: Some("/private.ics".to_string()),
        upstream_timeout_sec: Some(10),
        ..Default::default()
      }),
    };

    let conf = build(config_toml.clone(), ConfigOverrides::default()).unwrap();
    assert_eq!(conf.listener_socket.to_string(), "127.0.0.1:8080");
    assert_eq!(conf.relay.upstream.url.as_str(), "https://file.test/cal.ics");
    assert_eq!(conf.relay.access_token.as_deref(), Some("from-file"));
    assert_eq!(conf.relay.calendar_path, "/private.ics");
    assert_eq!(conf.relay.upstream.timeout, Duration::from_secs(10));

    let mut o = overrides(Some("https://env.test/cal.ics"), Some("from-env"));
    o.listen_port = Some(9000);
    let conf = build(config_toml, o).unwrap();
    assert_eq!(conf.listener_socket.to_string(), "127.0.0.1:9000");
    assert_eq!(conf.relay.upstream.url.as_str(), "https://env.test/cal.ics");
    assert_eq!(conf.relay.access_token.as_deref(), Some("from-env"));
  }

  #[test]
  fn reject_invalid_file_values() {
    let base = overrides(Some("https://example.test/cal.ics"), Some("secret123"));
    let with_relay = |relay: Relay| ConfigToml {
      relay: Some(relay),
      ..Default::default()
    };

    let bad_path = with_relay(Relay {
      calendar_path: Some("calendar.ics".to_string()),
      ..Default::default()
    });
    assert!(build(bad_path, base.clone()).is_err());

    let same_path = with_relay(Relay {
      calendar_path: Some("/health".to_string()),
      ..Default::default()
    });
    assert!(build(same_path, base.clone()).is_err());

    let zero_timeout = with_relay(Relay {
      upstream_timeout_sec: Some(0),
      ..Default::default()
    });
    assert!(build(zero_timeout, base.clone()).is_err());

    let bad_address = ConfigToml {
      listen_address: Some("localhost:80".to_string()),
      ..Default::default()
    };
    assert!(build(bad_address, base).is_err());
  }
}
