use clap::{Arg, ArgAction, ArgMatches, Command};

/// Parsed options
pub struct Opts {
  pub config_file_path: Option<String>,
  pub watch: bool,
  pub overrides: ConfigOverrides,
}

#[derive(PartialEq, Eq, Clone, Debug, Default)]
/// Values given by the command line or environment variables, taking precedence over the config file
pub struct ConfigOverrides {
  pub ics_url: Option<String>,
  pub access_token: Option<String>,
  pub listen_port: Option<u16>,
  pub no_auth: bool,
}

/// Parse arg values passed from cli
pub fn parse_opts() -> Result<Opts, anyhow::Error> {
  let matches = build_command().get_matches();
  Ok(opts_from_matches(&matches))
}

fn build_command() -> Command {
  let _ = include_str!("../../Cargo.toml");
  clap::command!()
    .arg(
      Arg::new("ics_url")
        .long("ics-url")
        .env("ICS_URL")
        .value_name("URL")
        .help("Upstream calendar url"),
    )
    .arg(
      Arg::new("access_token")
        .long("access-token")
        .env("ACCESS_TOKEN")
        .hide_env_values(true)
        .value_name("TOKEN")
        .help("Shared secret expected in the 'token' query parameter"),
    )
    .arg(
      Arg::new("port")
        .long("port")
        .short('p')
        .env("PORT")
        .value_name("PORT")
        .value_parser(clap::value_parser!(u16).range(1..))
        .help("Listen port [default: 8000]"),
    )
    .arg(
      Arg::new("no_auth")
        .long("no-auth")
        .action(ArgAction::SetTrue)
        .help("Serve the calendar without token authentication"),
    )
    .arg(
      Arg::new("config_file")
        .long("config")
        .short('c')
        .value_name("FILE")
        .help("Configuration file path like ./config.toml"),
    )
    .arg(
      Arg::new("watch")
        .long("watch")
        .short('w')
        .action(ArgAction::SetTrue)
        .requires("config_file")
        .help("Activate dynamic reloading of the config file via continuous monitoring"),
    )
}

fn opts_from_matches(matches: &ArgMatches) -> Opts {
  Opts {
    config_file_path: matches.get_one::<String>("config_file").cloned(),
    watch: matches.get_flag("watch"),
    overrides: ConfigOverrides {
      ics_url: matches.get_one::<String>("ics_url").cloned(),
      access_token: matches.get_one::<String>("access_token").cloned(),
      listen_port: matches.get_one::<u16>("port").copied(),
      no_auth: matches.get_flag("no_auth"),
    },
  }
}
