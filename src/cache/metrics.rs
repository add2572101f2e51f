// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how a [`TokenCache`](crate::TokenCache) served callers.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	synchronous_fetches: AtomicU64,
	background_refreshes: AtomicU64,
	skipped_refreshes: AtomicU64,
	failures: AtomicU64,
}
impl CacheMetrics {
	/// Returns how many calls were answered from the cached token without waiting on a fetch.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Returns how many caller-blocking fetches were performed.
	pub fn synchronous_fetches(&self) -> u64 {
		self.synchronous_fetches.load(Ordering::Relaxed)
	}

	/// Returns how many background refreshes were started.
	pub fn background_refreshes(&self) -> u64 {
		self.background_refreshes.load(Ordering::Relaxed)
	}

	/// Returns how many due refreshes were not started because a fetch was already in flight
	/// or no runtime was available.
	pub fn skipped_refreshes(&self) -> u64 {
		self.skipped_refreshes.load(Ordering::Relaxed)
	}

	/// Returns how many calls surfaced a failure to the caller.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_synchronous_fetch(&self) {
		self.synchronous_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_background_refresh(&self) {
		self.background_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_skipped_refresh(&self) {
		self.skipped_refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
