use crate::{constants::*, error::HttpError};
use http::{header, HeaderValue, Response, StatusCode};
use http_body_util::{combinators, BodyExt, Empty, Full};
use hyper::body::Bytes;

/// Type for synthetic boxed body
pub(crate) type BoxBody = combinators::BoxBody<Bytes, hyper::Error>;

/// build plain text http response
pub(crate) fn text_response(status_code: StatusCode, text: impl Into<Bytes>) -> Response<BoxBody> {
  let mut res = Response::new(full(text.into()));
  *res.status_mut() = status_code;
  res
    .headers_mut()
    .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
  res
}

/// build http response with status code of 4xx and 5xx from the error.
/// 5xx responses carry the error description so that clients can see why the upstream fetch failed.
pub(crate) fn synthetic_error_response(e: &HttpError) -> Response<BoxBody> {
  let status_code = StatusCode::from(e);
  let text = match status_code {
    StatusCode::NOT_FOUND => "Not Found".to_string(),
    s if s.is_server_error() => format!("Internal Server Error: {e}"),
    _ => e.to_string(),
  };
  text_response(status_code, text)
}

/// build calendar attachment response passing the upstream body through as is, never cached by clients
pub(crate) fn calendar_response(body: Bytes) -> Response<BoxBody> {
  let mut res = Response::new(full(body));
  let headers = res.headers_mut();
  headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CALENDAR_CONTENT_TYPE));
  headers.insert(
    header::CONTENT_DISPOSITION,
    HeaderValue::from_static(CALENDAR_CONTENT_DISPOSITION),
  );
  headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE_CONTROL));
  headers.insert(header::PRAGMA, HeaderValue::from_static(NO_CACHE_PRAGMA));
  headers.insert(header::EXPIRES, HeaderValue::from_static(EXPIRES_NOW));
  res
}

/// helper function to build a full body
pub(crate) fn full(body: Bytes) -> BoxBody {
  Full::new(body).map_err(|never| match never {}).boxed()
}

/// helper function to build a empty body
pub(crate) fn empty() -> BoxBody {
  Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn body_text(res: Response<BoxBody>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  #[tokio::test]
  async fn error_response_bodies() {
    let res = synthetic_error_response(&HttpError::NotFound);
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::CONTENT_TYPE], TEXT_CONTENT_TYPE);
    assert_eq!(body_text(res).await, "Not Found");

    let res = synthetic_error_response(&HttpError::InvalidToken);
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(res).await, "Invalid token");

    let res = synthetic_error_response(&HttpError::UpstreamTimeout);
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(res).await, "Internal Server Error: Upstream timeout");
  }

  #[tokio::test]
  async fn calendar_response_headers() {
    let res = calendar_response(Bytes::from_static(b"BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n"));
    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "text/calendar; charset=utf-8");
    assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"calendar.ics\"");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    assert_eq!(body_text(res).await, "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n");
  }
}
