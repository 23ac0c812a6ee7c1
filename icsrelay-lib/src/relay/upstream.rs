use crate::{
  constants::*,
  error::*,
  globals::UpstreamConfig,
  hyper_body::{empty, BoxBody},
  hyper_client::HttpClient,
  trace::*,
};
use http::{
  header::{self, HeaderMap, HeaderValue},
  Method, Request, Response, StatusCode, Uri,
};
use http_body_util::{BodyExt, Limited};
use hyper::body::{Bytes, Incoming};
use hyper_util::client::legacy::connect::Connect;
use std::{sync::Arc, time::Duration};
use url::Url;

/// Fetcher of the upstream calendar file. Every call of `fetch` is a single attempt without retries, nothing is cached.
/// Redirects are followed like a browser does.
pub struct UpstreamFetcher<C>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  /// hyper client
  inner: Arc<HttpClient<C, BoxBody>>,
  /// upstream calendar url
  url: Url,
  /// request headers spoofing a desktop browser
  request_headers: HeaderMap,
  /// timeout covering redirects, the request and the response body
  timeout: Duration,
  /// limit of the calendar body size
  max_body_size: usize,
}

impl<C> UpstreamFetcher<C>
where
  C: Send + Sync + Connect + Clone + 'static,
{
  /// Build fetcher from the upstream config
  pub fn try_new(upstream: &UpstreamConfig, http_client: &Arc<HttpClient<C, BoxBody>>) -> Result<Self> {
    Uri::try_from(upstream.url.as_str())
      .map_err(|e| RelayError::InvalidConfig(format!("invalid upstream uri {}: {e}", upstream.origin())))?;
    let user_agent = HeaderValue::from_str(&upstream.user_agent)
      .map_err(|e| RelayError::InvalidConfig(format!("invalid user agent: {e}")))?;

    let mut request_headers = HeaderMap::new();
    request_headers.insert(header::USER_AGENT, user_agent);
    request_headers.insert(header::ACCEPT, HeaderValue::from_static(UPSTREAM_ACCEPT));
    request_headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(UPSTREAM_ACCEPT_LANGUAGE));

    Ok(Self {
      inner: http_client.clone(),
      url: upstream.url.clone(),
      request_headers,
      timeout: upstream.timeout,
      max_body_size: UPSTREAM_MAX_BODY_SIZE,
    })
  }

  /// Fetch the calendar file from upstream and return its body as is.
  /// Non-success statuses of the final response are errors carrying the status code and an excerpt of the body.
  pub async fn fetch(&self) -> HttpResult<Bytes> {
    info!("Downloading calendar from upstream");
    match tokio::time::timeout(self.timeout, self.fetch_inner()).await {
      Ok(res) => res,
      Err(_) => {
        warn!("Upstream did not respond within {} secs", self.timeout.as_secs());
        Err(HttpError::UpstreamTimeout)
      }
    }
  }

  async fn fetch_inner(&self) -> HttpResult<Bytes> {
    let response = self.follow_redirects().await?;
    let status = response.status();
    info!("Upstream response status: {}", status);

    if !status.is_success() {
      let body = error_body_excerpt(response.into_body()).await;
      error!("Upstream returned error status {}: {}", status, body);
      return Err(HttpError::UpstreamStatus {
        status: status.as_u16(),
        body,
      });
    }

    let body = Limited::new(response.into_body(), self.max_body_size)
      .collect()
      .await
      .map_err(|e| HttpError::UpstreamBody(e.to_string()))?
      .to_bytes();

    if !is_calendar(&body) {
      warn!("Upstream body does not look like an iCalendar file, relaying anyway");
    }
    info!("Downloaded calendar: {} bytes", body.len());
    Ok(body)
  }

  /// Send GET to the upstream and follow redirects, returning the first non-redirect response
  async fn follow_redirects(&self) -> HttpResult<Response<Incoming>> {
    let mut url = self.url.clone();
    for _ in 0..=UPSTREAM_MAX_REDIRECTS {
      let response = self.get(&url).await?;
      let Some(location) = redirect_location(&response) else {
        return Ok(response);
      };
      let next = url
        .join(location)
        .map_err(|e| HttpError::UpstreamRedirect(format!("invalid location: {e}")))?;
      if !matches!(next.scheme(), "http" | "https") {
        return Err(HttpError::UpstreamRedirect(format!(
          "unsupported scheme: {}",
          next.scheme()
        )));
      }
      debug!("Upstream redirects ({}) to {}", response.status(), next.host_str().unwrap_or_default());
      url = next;
    }
    Err(HttpError::UpstreamRedirect(format!(
      "more than {UPSTREAM_MAX_REDIRECTS} redirects"
    )))
  }

  async fn get(&self, url: &Url) -> HttpResult<Response<Incoming>> {
    let uri = Uri::try_from(url.as_str()).map_err(|e| HttpError::UpstreamRedirect(e.to_string()))?;
    let mut req = Request::new(empty());
    *req.method_mut() = Method::GET;
    *req.uri_mut() = uri;
    *req.headers_mut() = self.request_headers.clone();

    self.inner.request(req).await.map_err(|e| {
      warn!("Upstream request error: {}", e);
      HttpError::UpstreamRequest(e)
    })
  }
}

/// Location of a redirect response, None for any other response
fn redirect_location<B>(response: &Response<B>) -> Option<&str> {
  match response.status() {
    StatusCode::MOVED_PERMANENTLY
    | StatusCode::FOUND
    | StatusCode::SEE_OTHER
    | StatusCode::TEMPORARY_REDIRECT
    | StatusCode::PERMANENT_REDIRECT => response.headers().get(header::LOCATION)?.to_str().ok(),
    _ => None,
  }
}

/// Read the body of an error response as far as possible, and cut it down for error messages.
/// A body read failure only results in an empty excerpt.
async fn error_body_excerpt(body: Incoming) -> String {
  let bytes = match body.collect().await {
    Ok(collected) => collected.to_bytes(),
    Err(e) => {
      debug!("Failed to read upstream error body: {}", e);
      return String::new();
    }
  };
  truncate_chars(&String::from_utf8_lossy(&bytes), UPSTREAM_ERROR_EXCERPT_LEN)
}

/// Take at most `max` characters, never splitting a multibyte character
fn truncate_chars(text: &str, max: usize) -> String {
  text.chars().take(max).collect()
}

/// Advisory check of the iCalendar header
fn is_calendar(body: &[u8]) -> bool {
  let magic = ICS_MAGIC.as_bytes();
  body.windows(magic.len()).any(|w| w == magic)
}
