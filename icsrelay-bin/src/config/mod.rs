mod parse;
mod relay_config;
mod toml;

pub use {
  parse::parse_opts,
  relay_config::{AppConfig, ConfigReloader, ConfigSource},
};
