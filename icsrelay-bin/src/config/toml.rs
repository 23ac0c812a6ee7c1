use crate::error::*;
use serde::Deserialize;
use std::fs;

#[derive(Deserialize, Debug, Default, PartialEq, Eq, Clone)]
/// Config toml
pub struct ConfigToml {
  /// Listen address [default: "0.0.0.0"]
  pub listen_address: Option<String>,
  /// Listen port [default: 8000]
  pub listen_port: Option<u16>,
  /// Relay settings
  pub relay: Option<Relay>,
}

#[derive(Deserialize, Debug, Default, PartialEq, Eq, Clone)]
/// Relay settings
pub struct Relay {
  /// Upstream calendar url
  pub ics_url: Option<String>,
  /// Shared secret expected in the token query parameter
  pub access_token: Option<String>,
  /// Serving path of the calendar [default: "/calendar.ics"]
  pub calendar_path: Option<String>,
  /// Serving path of the health check [default: "/health"]
  pub health_path: Option<String>,
  /// User agent presented to the upstream [default: desktop Chrome]
  pub user_agent: Option<String>,
  /// Upstream timeout in seconds [default: 30]
  pub upstream_timeout_sec: Option<u64>,
}

impl ConfigToml {
  pub(super) fn new(config_file: &str) -> anyhow::Result<Self> {
    let config_str = fs::read_to_string(config_file)?;

    toml::from_str(&config_str).map_err(|e| anyhow!(e))
  }
}
