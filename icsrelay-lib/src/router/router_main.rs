use super::{router_serve_req::serve_request, socket::bind_tcp_socket};
use crate::{
  count::ConnectionCount, error::*, globals::Globals, hyper_body::BoxBody, hyper_client::HttpClient,
  hyper_executor::LocalExecutor, relay::InnerRelay, trace::*, validator::TokenValidator,
};
use hyper::{
  body::Incoming,
  rt::{Read, Write},
  service::service_fn,
  Request,
};
use hyper_util::{client::legacy::connect::Connect, rt::TokioIo, server::conn::auto::Builder as ConnectionBuilder};
use std::{net::SocketAddr, sync::Arc};
use tokio::time::timeout;
use tracing::Instrument as _;

#[derive(Clone)]
/// Relay router main object
pub struct Router<C>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  /// global config
  pub(crate) globals: Arc<Globals>,
  /// hyper server receiving http request
  pub(crate) http_server: Arc<ConnectionBuilder<LocalExecutor>>,
  /// calendar relay fetching from upstream
  pub(crate) inner_relay: Arc<InnerRelay<C>>,
  /// validator for the access token, None if the calendar is served without authentication
  pub(crate) inner_validator: Option<Arc<TokenValidator>>,
  /// url path of the health check
  pub(crate) health_path: String,
  /// in-flight connection count
  pub(crate) connection_count: ConnectionCount,
}

impl<C> Router<C>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  /// Serve tcp stream
  fn serve_connection<I>(&self, stream: I, peer_addr: SocketAddr)
  where
    I: Read + Write + Unpin + Send + 'static,
  {
    let connection_count = self.connection_count.clone();
    if !connection_count.try_acquire(self.globals.service_config.max_clients) {
      warn!("Too many connections, dropping connection from {}", peer_addr);
      return;
    }
    debug!("Connection incoming: current # {}", connection_count.current());

    let self_clone = self.clone();
    let server_clone = self.http_server.clone();
    let timeout_sec = self.globals.service_config.timeout;
    self.globals.runtime_handle.clone().spawn(async move {
      timeout(
        timeout_sec,
        server_clone.serve_connection(
          stream,
          service_fn(move |req: Request<Incoming>| {
            // the query string carries the access token, so only the path is recorded
            let current_span =
              tracing::info_span!("router_serve", method = ?req.method(), path = req.uri().path(), peer_addr = ?peer_addr);
            serve_request(req, self_clone.clone()).instrument(current_span)
          }),
        ),
      )
      .await
      .ok();

      connection_count.decrement();
      debug!("Connection closed: current # {}", connection_count.current());
    });
  }

  /// Start http routing service
  async fn router_service(&self) -> Result<()> {
    let tcp_socket = bind_tcp_socket(&self.globals.service_config.listener_socket)?;
    let tcp_listener = tcp_socket.listen(self.globals.service_config.tcp_listen_backlog)?;
    info!("Start TCP listener on {}", self.globals.service_config.listener_socket);
    while let Ok((stream, peer_addr)) = tcp_listener.accept().await {
      self.serve_connection(TokioIo::new(stream), peer_addr);
    }
    Ok(())
  }

  /// Entrypoint for HTTP/1.1 and HTTP/2 servers
  pub async fn start(&self) -> Result<()> {
    info!("Start calendar relay service");

    match &self.globals.term_notify {
      Some(term) => {
        tokio::select! {
          res = self.router_service() => {
            warn!("Http routing service got down");
            res?;
          }
          _ = term.notified() => {
            info!("Http routing service receives term signal");
          }
        }
      }
      None => {
        self.router_service().await?;
        warn!("Http routing service got down");
      }
    }
    Ok(())
  }

  /// build router
  pub fn try_new(
    globals: &Arc<Globals>,
    http_server: &Arc<ConnectionBuilder<LocalExecutor>>,
    http_client: &Arc<HttpClient<C, BoxBody>>,
  ) -> Result<Self> {
    let relay_config = &globals.service_config.relay;
    let inner_validator = match relay_config.access_token.as_deref() {
      Some(token) => Some(TokenValidator::new(token)),
      None => {
        warn!("No access token is configured. Calendar is served without authentication");
        None
      }
    };
    let inner_relay = InnerRelay::try_new(globals, http_client)?;

    Ok(Self {
      globals: globals.clone(),
      http_server: http_server.clone(),
      inner_relay,
      inner_validator,
      health_path: relay_config.health_path.clone(),
      connection_count: globals.connection_count.clone(),
    })
  }
}
