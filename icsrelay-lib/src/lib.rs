mod constants;
mod count;
mod error;
mod globals;
mod hyper_body;
mod hyper_client;
mod hyper_executor;
mod oneshot;
mod relay;
mod router;
mod trace;
mod validator;

#[cfg(test)]
mod test_util;

use crate::{count::ConnectionCount, globals::Globals, router::Router, trace::*};
use hyper_client::HttpClient;
use hyper_executor::LocalExecutor;
use hyper_util::server::{self, conn::auto::Builder as ConnectionBuilder};
use std::sync::Arc;

pub use constants::{BROWSER_USER_AGENT, CALENDAR_PATH, DEFAULT_LISTEN_PORT, HEALTH_PATH, UPSTREAM_TIMEOUT_SEC};
pub use error::{HttpError, RelayError, Result};
pub use globals::{RelayConfig, ServiceConfig, UpstreamConfig};
pub use oneshot::fetch_to_file;

/// Entry point of the relay
pub async fn entrypoint(
  service_config: &ServiceConfig,
  runtime_handle: &tokio::runtime::Handle,
  term_notify: Option<Arc<tokio::sync::Notify>>,
) -> Result<()> {
  // build globals
  let globals = Arc::new(Globals {
    service_config: service_config.clone(),
    runtime_handle: runtime_handle.clone(),
    term_notify: term_notify.clone(),
    connection_count: ConnectionCount::default(),
  });
  // build http client
  let http_client = Arc::new(HttpClient::try_new(runtime_handle.clone())?);

  // build http_server
  let http_server = build_hyper_server(&globals);

  // build router
  let router = Router::try_new(&globals, &http_server, &http_client)?;

  // start router
  if let Err(e) = router.start().await {
    warn!("Calendar relay service stopped: {e}");
    return Err(e);
  }

  Ok(())
}

/// build hyper server
fn build_hyper_server(globals: &Arc<Globals>) -> Arc<ConnectionBuilder<LocalExecutor>> {
  let executor = LocalExecutor::new(globals.runtime_handle.clone());
  let mut server = server::conn::auto::Builder::new(executor);
  server
    .http1()
    .keep_alive(globals.service_config.keepalive)
    .pipeline_flush(true);
  server
    .http2()
    .max_concurrent_streams(globals.service_config.max_concurrent_streams);
  Arc::new(server)
}
