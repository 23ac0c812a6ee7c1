use super::upstream::UpstreamFetcher;
use crate::{
  error::*,
  globals::Globals,
  hyper_body::{calendar_response, BoxBody},
  hyper_client::HttpClient,
  trace::*,
};
use http::{Method, Request, Response};
use hyper_util::client::legacy::connect::Connect;
use std::sync::Arc;

/// Calendar relay serving the upstream file under the calendar path
pub struct InnerRelay<C>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  /// upstream fetcher
  pub(super) fetcher: UpstreamFetcher<C>,
  /// url path serving the calendar
  pub(crate) calendar_path: String,
}

impl<C> InnerRelay<C>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  /// Serve request as relay
  /// 1. check listening path and method: only GET is served.
  /// 2. fetch the calendar from upstream with the spoofed browser headers, exactly once per request.
  /// 3. return the upstream body untouched as an attachment that must not be cached.
  ///
  /// Authentication is done by the router before reaching here.
  pub async fn serve<B>(&self, req: Request<B>) -> HttpResult<Response<BoxBody>> {
    // check path
    if req.uri().path() != self.calendar_path {
      return Err(HttpError::NotFound);
    };
    // check method
    if req.method() != Method::GET {
      debug!("Unsupported method for calendar: {}", req.method());
      return Err(HttpError::NotFound);
    };

    let body = self.fetcher.fetch().await?;
    info!("Relaying calendar: {} bytes", body.len());
    Ok(calendar_response(body))
  }

  /// Build inner relay
  pub fn try_new(globals: &Arc<Globals>, http_client: &Arc<HttpClient<C, BoxBody>>) -> Result<Arc<Self>> {
    let relay_config = &globals.service_config.relay;
    let fetcher = UpstreamFetcher::try_new(&relay_config.upstream, http_client)?;

    Ok(Arc::new(Self {
      fetcher,
      calendar_path: relay_config.calendar_path.clone(),
    }))
  }
}
