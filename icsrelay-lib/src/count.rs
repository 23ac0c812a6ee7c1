use std::sync::{
  atomic::{AtomicIsize, Ordering},
  Arc,
};

#[derive(Debug, Clone, Default)]
/// Number of in-flight connections shared between the listener and spawned connection tasks.
/// Relaxed ordering is enough since the value only gates admission of new connections.
pub struct ConnectionCount(Arc<AtomicIsize>);

impl ConnectionCount {
  pub fn current(&self) -> isize {
    self.0.load(Ordering::Relaxed)
  }

  /// Register a new connection and return the in-flight count including it
  pub fn increment(&self) -> isize {
    self.0.fetch_add(1, Ordering::Relaxed) + 1
  }

  /// Release a connection and return the remaining in-flight count
  pub fn decrement(&self) -> isize {
    self.0.fetch_sub(1, Ordering::Relaxed) - 1
  }

  /// Try to admit a new connection under `max_clients`, rolling back when the limit is exceeded
  pub fn try_acquire(&self, max_clients: usize) -> bool {
    if self.increment() > max_clients as isize {
      self.decrement();
      return false;
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counter_tracks_in_flight_connections() {
    let counter = ConnectionCount::default();
    assert_eq!(counter.current(), 0);
    assert_eq!(counter.increment(), 1);
    assert_eq!(counter.increment(), 2);
    assert_eq!(counter.decrement(), 1);
    assert_eq!(counter.decrement(), 0);
    assert_eq!(counter.current(), 0);
  }

  #[test]
  fn acquire_respects_max_clients() {
    let counter = ConnectionCount::default();
    let shared = counter.clone();
    assert!(counter.try_acquire(2));
    assert!(shared.try_acquire(2));
    assert!(!counter.try_acquire(2));
    assert_eq!(shared.current(), 2);

    shared.decrement();
    assert!(counter.try_acquire(2));
    assert_eq!(counter.current(), 2);
  }
}
