pub const DEFAULT_LISTEN_PORT: u16 = 8000;
pub const CALENDAR_PATH: &str = "/calendar.ics";
pub const HEALTH_PATH: &str = "/health";

pub const TCP_LISTEN_BACKLOG: u32 = 1024;
pub const MAX_CLIENTS: usize = 1024;
pub const MAX_CONCURRENT_STREAMS: u32 = 100;
pub const KEEPALIVE: bool = true;
/// Timeout for serving a whole connection in seconds, must be longer than the upstream one
pub const TIMEOUT: u64 = 60;

// Upstream fetch

/// Upstream rejects non-browser clients with 500, so we pretend to be a desktop Chrome.
pub const BROWSER_USER_AGENT: &str =
  "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";
pub const UPSTREAM_ACCEPT: &str = "text/calendar,*/*;q=0.8";
pub const UPSTREAM_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
/// Upstream request timeout in seconds, covering the response body as well
pub const UPSTREAM_TIMEOUT_SEC: u64 = 30;
/// Maximum number of characters of an upstream error body carried in the error message
pub const UPSTREAM_ERROR_EXCERPT_LEN: usize = 200;
/// Maximum number of redirects followed for a single fetch
pub const UPSTREAM_MAX_REDIRECTS: usize = 10;
/// Maximum size of the upstream calendar body in bytes
pub const UPSTREAM_MAX_BODY_SIZE: usize = 32 * 1024 * 1024;

// Calendar response

pub const ICS_MAGIC: &str = "BEGIN:VCALENDAR";
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=utf-8";
pub const CALENDAR_CONTENT_DISPOSITION: &str = "attachment; filename=\"calendar.ics\"";
pub const NO_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";
pub const NO_CACHE_PRAGMA: &str = "no-cache";
pub const EXPIRES_NOW: &str = "0";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

// Authentication

/// Query parameter carrying the access token (/calendar.ics?token=...)
pub const TOKEN_QUERY_PARAM: &str = "token";
