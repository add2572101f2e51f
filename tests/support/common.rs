#![allow(dead_code)]

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use time::{Duration, OffsetDateTime};
// self
use token_lifecycle::{
	Token,
	fetch::{FetchFuture, TokenFetcher},
};

type Script = Box<dyn Fn(usize) -> Token + Send + Sync>;

/// Fetcher that counts calls, sleeps for a fixed delay, and builds each token from a script.
pub struct ScriptedFetcher {
	calls: AtomicUsize,
	delay: std::time::Duration,
	script: Script,
}
impl ScriptedFetcher {
	pub fn new(script: impl 'static + Fn(usize) -> Token + Send + Sync) -> Arc<Self> {
		Self::delayed(std::time::Duration::ZERO, script)
	}

	pub fn delayed(
		delay: std::time::Duration,
		script: impl 'static + Fn(usize) -> Token + Send + Sync,
	) -> Arc<Self> {
		Arc::new(Self { calls: AtomicUsize::new(0), delay, script: Box::new(script) })
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl TokenFetcher for ScriptedFetcher {
	fn fetch(&self) -> FetchFuture<'_> {
		Box::pin(async move {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

			if !self.delay.is_zero() {
				tokio::time::sleep(self.delay).await;
			}

			(self.script)(call)
		})
	}
}

/// Server-TTL token `token-{call}` that expires one hour after `base`.
pub fn hourly(base: OffsetDateTime) -> impl Fn(usize) -> Token + Send + Sync {
	move |call| {
		Token::from_server_ttl(format!("token-{call}"), Duration::hours(1), base + Duration::hours(1))
	}
}

/// Builds an unsigned JWT carrying the provided claims JSON.
pub fn unsigned_jwt(claims: &str) -> String {
	format!(
		"{}.{}.",
		URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#),
		URL_SAFE_NO_PAD.encode(claims)
	)
}

/// Polls `condition` every few milliseconds until it holds or a second elapses.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
	tokio::time::timeout(std::time::Duration::from_secs(1), async {
		while !condition() {
			tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		}
	})
	.await
	.is_ok()
}
