pub use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Library crate emitting relay and upstream events
const LIB_CRATE_NAME: &str = "ics_relay_lib";

/// Initialize tracing subscriber
pub fn init_tracing_subscriber() {
  let format_layer = fmt::layer()
    .with_line_number(false)
    .with_thread_ids(false)
    .with_thread_names(true)
    .with_target(true)
    .with_level(true)
    .compact();

  // This limits the logger to emit only this binary and the relay library
  let crate_name = env!("CARGO_CRATE_NAME");
  let level_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| "info".to_string());
  let filter_layer = EnvFilter::new(format!(
    "{crate_name}={level_string},{LIB_CRATE_NAME}={level_string}"
  ));

  tracing_subscriber::registry().with(format_layer).with(filter_layer).init();
}
