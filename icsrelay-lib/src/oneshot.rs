use crate::{error::*, globals::UpstreamConfig, hyper_client::HttpClient, relay::UpstreamFetcher, trace::*};
use std::{path::Path, sync::Arc};

/// Fetch the upstream calendar once and write it to `output` without running any server.
/// Returns the number of bytes written.
pub async fn fetch_to_file(
  upstream: &UpstreamConfig,
  output: &Path,
  runtime_handle: &tokio::runtime::Handle,
) -> Result<usize> {
  let http_client = Arc::new(HttpClient::try_new(runtime_handle.clone())?);
  let fetcher = UpstreamFetcher::try_new(upstream, &http_client)?;

  let body = fetcher.fetch().await?;
  tokio::fs::write(output, &body)
    .await
    .map_err(|source| RelayError::WriteFileError {
      path: output.display().to_string(),
      source,
    })?;
  info!("Calendar saved to {} ({} bytes)", output.display(), body.len());

  Ok(body.len())
}
