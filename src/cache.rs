//! Token cache and refresh orchestration for one authenticator instance.
//!
//! [`TokenCache::get_token`] answers from the cached [`Token`] whenever it is still valid. A
//! missing or unusable token triggers a caller-blocking fetch behind a single-flight guard, so
//! any number of concurrent callers share one call to the [`TokenFetcher`]. A valid token that
//! has crossed its refresh window is returned immediately while a detached task fetches its
//! replacement. The same guard bounds background refreshes, so at most one fetch of either kind
//! is in flight per cache.
//!
//! The current token lives in a slot that is only ever replaced wholesale (`Arc` swap), paired
//! with a generation counter. A caller that waited on the guard and finds the generation moved
//! reuses whatever the completed fetch stored, including a failure, instead of fetching again.

mod metrics;

pub use metrics::CacheMetrics;

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	fetch::TokenFetcher,
	obs::{self, FetchKind, FetchOutcome, FetchSpan},
	token::{DEFAULT_REFRESH_GUARD, Token, TokenSecret},
};

/// Tuning knobs for a [`TokenCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenCacheConfig {
	/// Interval a token's refresh window moves forward each time it reports a due refresh.
	pub refresh_guard: Duration,
	/// Starts detached refreshes for valid tokens past their refresh window when `true`.
	pub background_refresh: bool,
}
impl TokenCacheConfig {
	/// Overrides the refresh guard (defaults to 60 seconds); negative values clamp to zero.
	pub fn with_refresh_guard(mut self, guard: Duration) -> Self {
		self.refresh_guard = if guard.is_negative() { Duration::ZERO } else { guard };

		self
	}

	/// Enables or disables background refreshes.
	pub fn with_background_refresh(mut self, enabled: bool) -> Self {
		self.background_refresh = enabled;

		self
	}
}
impl Default for TokenCacheConfig {
	fn default() -> Self {
		Self { refresh_guard: DEFAULT_REFRESH_GUARD, background_refresh: true }
	}
}

/// Caches the bearer token produced by a [`TokenFetcher`] and renews it on demand.
pub struct TokenCache<F>
where
	F: ?Sized + TokenFetcher,
{
	fetcher: Arc<F>,
	config: TokenCacheConfig,
	shared: Arc<Shared>,
}
impl<F> TokenCache<F>
where
	F: ?Sized + TokenFetcher,
{
	/// Creates an empty cache around the provided fetcher.
	pub fn new(fetcher: impl Into<Arc<F>>) -> Self {
		Self {
			fetcher: fetcher.into(),
			config: TokenCacheConfig::default(),
			shared: Arc::new(Shared {
				slot: RwLock::new(Slot::default()),
				fetch_guard: Arc::new(AsyncMutex::new(())),
				metrics: CacheMetrics::default(),
			}),
		}
	}

	/// Replaces the cache configuration.
	pub fn with_config(mut self, config: TokenCacheConfig) -> Self {
		self.config = config;

		self
	}

	/// Returns the active configuration.
	pub fn config(&self) -> &TokenCacheConfig {
		&self.config
	}

	/// Returns the fetcher backing this cache.
	pub fn fetcher(&self) -> &Arc<F> {
		&self.fetcher
	}

	/// Returns the counters recorded by this cache.
	pub fn metrics(&self) -> &CacheMetrics {
		&self.shared.metrics
	}

	/// Returns the token currently held by the cache, if any.
	pub fn current(&self) -> Option<Arc<Token>> {
		self.shared.slot.read().token.clone()
	}

	/// Drops the cached token so the next call performs a synchronous fetch.
	pub fn invalidate(&self) {
		let mut slot = self.shared.slot.write();

		slot.token = None;
		slot.generation = slot.generation.wrapping_add(1);
	}

	/// Returns a usable bearer token as of the current UTC instant.
	pub async fn get_token(&self) -> Result<TokenSecret> {
		self.get_token_at(OffsetDateTime::now_utc()).await
	}

	/// Returns a usable bearer token as of `now`.
	///
	/// Fails with [`Error::Authentication`] when the token obtained for this call carries a
	/// failure; a stale value is never returned alongside an error.
	pub async fn get_token_at(&self, now: OffsetDateTime) -> Result<TokenSecret> {
		self.token_at(now).await.access_token().inspect_err(|_| {
			self.shared.metrics.record_failure();
		})
	}

	/// Resolves the token that answers a call made at `now`, fetching when necessary.
	pub async fn token_at(&self, now: OffsetDateTime) -> Arc<Token> {
		let observed = self.shared.snapshot();

		if let Some(token) = observed.token.filter(|token| token.is_valid(now)) {
			self.shared.metrics.record_hit();

			if self.config.background_refresh
				&& token.needs_refresh_with_guard(now, self.config.refresh_guard)
			{
				self.spawn_refresh();
			}

			return token;
		}

		self.fetch_synchronously(now, observed.generation).await
	}

	async fn fetch_synchronously(
		&self,
		now: OffsetDateTime,
		observed_generation: u64,
	) -> Arc<Token> {
		const KIND: FetchKind = FetchKind::Synchronous;

		let _singleflight = self.shared.fetch_guard.lock().await;
		let current = self.shared.snapshot();

		// A newer generation is the outcome of the fetch this caller waited on, whatever it holds.
		if let Some(token) = current.token.filter(|token| {
			current.generation != observed_generation || token.is_valid(now)
		}) {
			return token;
		}

		let span = FetchSpan::new(KIND, "get_token");

		self.shared.metrics.record_synchronous_fetch();
		obs::record_fetch_outcome(KIND, FetchOutcome::Attempt);

		let started = Instant::now();
		let token = span.instrument(self.fetcher.fetch()).await;

		obs::record_fetch_duration(KIND, started);

		self.shared.store(KIND, token)
	}

	fn spawn_refresh(&self) {
		const KIND: FetchKind = FetchKind::Background;

		let Some(guard) = self.shared.fetch_guard.try_lock_arc() else {
			self.shared.metrics.record_skipped_refresh();
			obs::record_refresh_skipped("in_flight");

			return;
		};
		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			self.shared.metrics.record_skipped_refresh();
			obs::record_refresh_skipped("no_runtime");

			return;
		};
		let fetcher = self.fetcher.clone();
		let shared = self.shared.clone();
		let span = FetchSpan::new(KIND, "refresh");

		shared.metrics.record_background_refresh();
		obs::record_fetch_outcome(KIND, FetchOutcome::Attempt);

		runtime.spawn(span.instrument(async move {
			let started = Instant::now();
			let token = fetcher.fetch().await;

			obs::record_fetch_duration(KIND, started);

			shared.store(KIND, token);

			drop(guard);
		}));
	}
}
impl<F> Clone for TokenCache<F>
where
	F: ?Sized + TokenFetcher,
{
	fn clone(&self) -> Self {
		Self { fetcher: self.fetcher.clone(), config: self.config, shared: self.shared.clone() }
	}
}
impl<F> Debug for TokenCache<F>
where
	F: ?Sized + TokenFetcher,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let slot = self.shared.snapshot();

		f.debug_struct("TokenCache")
			.field("config", &self.config)
			.field("current", &slot.token)
			.field("generation", &slot.generation)
			.finish()
	}
}

struct Shared {
	slot: RwLock<Slot>,
	fetch_guard: Arc<AsyncMutex<()>>,
	metrics: CacheMetrics,
}
impl Shared {
	fn snapshot(&self) -> Slot {
		self.slot.read().clone()
	}

	fn store(&self, kind: FetchKind, token: Token) -> Arc<Token> {
		match token.error() {
			Some(error) => {
				obs::record_fetch_failure(kind, error);
				obs::record_fetch_outcome(kind, FetchOutcome::Failure);
			},
			None => obs::record_fetch_outcome(kind, FetchOutcome::Success),
		}

		let token = Arc::new(token);
		let mut slot = self.slot.write();

		slot.token = Some(token.clone());
		slot.generation = slot.generation.wrapping_add(1);

		token
	}
}

#[derive(Clone, Default)]
struct Slot {
	token: Option<Arc<Token>>,
	generation: u64,
}
