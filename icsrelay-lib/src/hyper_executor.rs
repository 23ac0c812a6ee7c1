use hyper::rt::Executor;
use std::future::Future;
use tokio::runtime::Handle;

#[derive(Clone)]
/// Executor for hyper that spawns tasks onto the given tokio runtime handle
pub struct LocalExecutor {
  runtime_handle: Handle,
}

impl LocalExecutor {
  pub fn new(runtime_handle: Handle) -> Self {
    LocalExecutor { runtime_handle }
  }
}

impl<F> Executor<F> for LocalExecutor
where
  F: Future + Send + 'static,
  F::Output: Send,
{
  fn execute(&self, fut: F) {
    self.runtime_handle.spawn(fut);
  }
}
