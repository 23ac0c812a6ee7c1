pub const CONFIG_WATCH_DELAY_SECS: u32 = 30;
/// Extra time given to a connection on top of the upstream timeout
pub const CONNECTION_TIMEOUT_MARGIN_SECS: u64 = 5;
