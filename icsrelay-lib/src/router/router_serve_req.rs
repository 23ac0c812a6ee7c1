use super::router_main::Router;
use crate::{
  error::*,
  hyper_body::{synthetic_error_response, text_response, BoxBody},
  trace::*,
};
use http::{Method, Request, Response, StatusCode};
use hyper_util::client::legacy::connect::Connect;
use tracing::Instrument as _;

/// Dispatch a request by path. Every failure is turned into a response here and never goes up to the connection.
pub(super) async fn serve_request<B, C>(req: Request<B>, router: Router<C>) -> Result<Response<BoxBody>>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  let path = req.uri().path();
  info!(method = %req.method(), path, "request received");

  // health check, served without authentication for any method
  if path == router.health_path {
    debug!("health check");
    return Ok(text_response(StatusCode::OK, "OK"));
  }

  // calendar relay
  if path == router.inner_relay.calendar_path && req.method() == Method::GET {
    if let Some(validator) = router.inner_validator.as_ref() {
      if let Err(e) = validator.validate_request(&req) {
        warn!("authentication failed: {}", e);
        return Ok(synthetic_error_response(&e));
      }
      debug!("passed token validation");
    }

    let relay_span = tracing::info_span!("relay");
    return match router.inner_relay.serve(req).instrument(relay_span).await {
      Ok(res) => Ok(res),
      Err(e) => {
        error!("Relay failed to serve: {}", e);
        Ok(synthetic_error_response(&e))
      }
    };
  }

  debug!("no route matched");
  Ok(synthetic_error_response(&HttpError::NotFound))
}
