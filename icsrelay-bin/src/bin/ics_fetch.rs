//! One-shot variant of the relay: fetch the upstream calendar once, save it to a local file and exit.

#[allow(unused_imports)]
#[path = "../trace.rs"]
mod trace;

use crate::trace::*;
use clap::{Arg, ArgMatches, Command};
use ics_relay_lib::{fetch_to_file, UpstreamConfig};
use std::path::PathBuf;

const DEFAULT_OUTPUT: &str = "calendar.ics";

fn build_command() -> Command {
  let _ = include_str!("../../Cargo.toml");
  clap::command!()
    .name("ics-fetch")
    .about("Fetch the upstream calendar once and save it to a local file")
    .arg(
      Arg::new("ics_url")
        .long("ics-url")
        .env("ICS_URL")
        .value_name("URL")
        .required(true)
        .help("Upstream calendar url"),
    )
    .arg(
      Arg::new("output")
        .long("output")
        .short('o')
        .value_name("FILE")
        .default_value(DEFAULT_OUTPUT)
        .help("Output file path"),
    )
    .arg(
      Arg::new("user_agent")
        .long("user-agent")
        .value_name("USER_AGENT")
        .help("User agent presented to the upstream [default: desktop Chrome]"),
    )
}

/// Build upstream config and output path from the parsed options
fn upstream_from_matches(matches: &ArgMatches) -> anyhow::Result<(UpstreamConfig, PathBuf)> {
  let Some(ics_url) = matches.get_one::<String>("ics_url") else {
    anyhow::bail!("Upstream calendar url is required: set ICS_URL");
  };
  let mut upstream = UpstreamConfig::try_new(ics_url)?;
  if let Some(user_agent) = matches.get_one::<String>("user_agent") {
    upstream = upstream.with_user_agent(user_agent)?;
  }
  let output = matches
    .get_one::<String>("output")
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
  Ok((upstream, output))
}

fn main() {
  let matches = build_command().get_matches();
  init_tracing_subscriber();

  let (upstream, output) = match upstream_from_matches(&matches) {
    Ok(v) => v,
    Err(e) => {
      error!("Invalid configuration: {e}");
      std::process::exit(1);
    }
  };

  let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
    Ok(runtime) => runtime,
    Err(e) => {
      error!("Failed to build tokio runtime: {e}");
      std::process::exit(1);
    }
  };

  let res = runtime.block_on(fetch_to_file(&upstream, &output, runtime.handle()));
  match res {
    Ok(len) => info!("Fetched {} bytes from {} into {}", len, upstream.origin(), output.display()),
    Err(e) => {
      error!("Failed to fetch calendar: {e}");
      std::process::exit(1);
    }
  }
}
