use crate::{error::*, hyper_body::BoxBody, hyper_executor::LocalExecutor, trace::*};
use http::{Request, Response};
use hyper::body::{Body, Incoming};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{
  connect::{Connect, HttpConnector},
  Client,
};
use tracing::instrument;

/// Connector of the upstream client, https with rustls or plain http
pub type DefaultConnector = HttpsConnector<HttpConnector>;

#[derive(Clone)]
/// Http client that is used for fetching calendar files from upstream.
pub struct HttpClient<C, B = BoxBody>
where
  C: Send + Sync + Connect + Clone + 'static,
  B: Body + Send + Unpin + 'static,
  <B as Body>::Data: Send,
  <B as Body>::Error: Into<Box<(dyn std::error::Error + Send + Sync + 'static)>>,
{
  pub inner: Client<C, B>,
}

impl<C, B> HttpClient<C, B>
where
  C: Send + Sync + Connect + Clone + 'static,
  B: Body + Send + Unpin + 'static,
  <B as Body>::Data: Send,
  <B as Body>::Error: Into<Box<(dyn std::error::Error + Send + Sync + 'static)>>,
{
  #[instrument(level = "debug", name = "http_request", skip_all)]
  /// wrapper request fn
  pub async fn request(
    &self,
    req: Request<B>,
  ) -> std::result::Result<Response<Incoming>, hyper_util::client::legacy::Error> {
    self.inner.request(req).await
  }
}

/// Build client with hyper-rustls (rustls)
impl<B> HttpClient<DefaultConnector, B>
where
  B: Body + Send + Unpin + 'static,
  <B as Body>::Data: Send,
  <B as Body>::Error: Into<Box<(dyn std::error::Error + Send + Sync + 'static)>>,
{
  /// Build inner client with rustls and webpki roots.
  /// Plain http is allowed as well since the upstream url is given by the operator.
  pub fn try_new(runtime_handle: tokio::runtime::Handle) -> Result<Self> {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_reuse_address(true);
    let connector = hyper_rustls::HttpsConnectorBuilder::new()
      .with_webpki_roots()
      .https_or_http()
      .enable_http1()
      .enable_http2()
      .wrap_connector(http);
    debug!("Built upstream http client with rustls");

    let executor = LocalExecutor::new(runtime_handle);
    let inner = Client::builder(executor).build::<_, B>(connector);
    Ok(Self { inner })
  }
}
