use http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::{
  body::{Bytes, Incoming},
  service::service_fn,
};
use hyper_util::{
  rt::{TokioExecutor, TokioIo},
  server::conn::auto::Builder as ConnectionBuilder,
};
use std::{
  convert::Infallible,
  net::SocketAddr,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  },
  time::Duration,
};
use tokio::net::TcpListener;

struct MockState {
  status: StatusCode,
  body: Bytes,
  delay: Duration,
  location: Option<String>,
  hits: AtomicUsize,
  last_request_headers: Mutex<Option<HeaderMap>>,
}

/// Upstream calendar server answering every request with a fixed status and body, counting hits
pub(crate) struct MockUpstream {
  addr: SocketAddr,
  state: Arc<MockState>,
}

impl MockUpstream {
  pub(crate) async fn start(status: StatusCode, body: impl Into<Bytes>) -> Self {
    Self::start_with_delay(status, body, Duration::ZERO).await
  }

  pub(crate) async fn start_with_delay(status: StatusCode, body: impl Into<Bytes>, delay: Duration) -> Self {
    Self::spawn(MockState {
      status,
      body: body.into(),
      delay,
      location: None,
      hits: AtomicUsize::new(0),
      last_request_headers: Mutex::new(None),
    })
    .await
  }

  /// Answer every request with a redirect to `location`
  pub(crate) async fn redirect(status: StatusCode, location: impl Into<String>) -> Self {
    Self::spawn(MockState {
      status,
      body: Bytes::new(),
      delay: Duration::ZERO,
      location: Some(location.into()),
      hits: AtomicUsize::new(0),
      last_request_headers: Mutex::new(None),
    })
    .await
  }

  async fn spawn(state: MockState) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(state);

    let state_clone = state.clone();
    tokio::spawn(async move {
      while let Ok((stream, _)) = listener.accept().await {
        let state = state_clone.clone();
        tokio::spawn(async move {
          let service = service_fn(move |req: Request<Incoming>| {
            let state = state.clone();
            async move {
              state.hits.fetch_add(1, Ordering::SeqCst);
              *state.last_request_headers.lock().unwrap() = Some(req.headers().clone());
              if !state.delay.is_zero() {
                tokio::time::sleep(state.delay).await;
              }
              let mut res = Response::new(Full::new(state.body.clone()));
              *res.status_mut() = state.status;
              if let Some(location) = &state.location {
                res
                  .headers_mut()
                  .insert(header::LOCATION, HeaderValue::from_str(location).unwrap());
              }
              Ok::<_, Infallible>(res)
            }
          });
          ConnectionBuilder::new(TokioExecutor::new())
            .serve_connection(TokioIo::new(stream), service)
            .await
            .ok();
        });
      }
    });

    Self { addr, state }
  }

  pub(crate) fn url(&self) -> String {
    format!("http://{}/cal.ics", self.addr)
  }

  pub(crate) fn hits(&self) -> usize {
    self.state.hits.load(Ordering::SeqCst)
  }

  pub(crate) fn last_request_headers(&self) -> Option<HeaderMap> {
    self.state.last_request_headers.lock().unwrap().clone()
  }
}
