//! Fetcher contract implemented by each provider-specific authenticator.

// self
use crate::{_prelude::*, token::Token};

/// Boxed future returned by [`TokenFetcher::fetch`].
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Token> + 'a + Send>>;

/// Produces a fresh [`Token`] from a remote token service.
///
/// Implementations own request construction, transport, and response parsing. They must never
/// fail past this boundary: every failure (network, non-2xx status, malformed body, missing
/// claims) is returned as [`Token::from_error`]. The cache shares one fetcher across callers
/// and background tasks, so implementations must be `Send + Sync + 'static`.
pub trait TokenFetcher
where
	Self: 'static + Send + Sync,
{
	/// Performs one fetch.
	fn fetch(&self) -> FetchFuture<'_>;
}

/// Fetcher that hands out a caller-supplied, non-expiring token.
#[derive(Clone)]
pub struct StaticTokenFetcher {
	access_token: String,
}
impl StaticTokenFetcher {
	/// Wraps the provided bearer token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: access_token.into() }
	}
}
impl TokenFetcher for StaticTokenFetcher {
	fn fetch(&self) -> FetchFuture<'_> {
		let token = Token::non_expiring(self.access_token.clone());

		Box::pin(async move { token })
	}
}
impl Debug for StaticTokenFetcher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StaticTokenFetcher").field("access_token", &"<redacted>").finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn static_fetcher_yields_non_expiring_tokens() {
		let fetcher = StaticTokenFetcher::new("apikey-token");
		let token = fetcher.fetch().await;

		assert_eq!(token.expires_at(), None);
		assert_eq!(
			token.access_token().expect("Static token should be usable.").expose(),
			"apikey-token"
		);
		assert!(!format!("{fetcher:?}").contains("apikey-token"));
	}

	#[tokio::test]
	async fn empty_static_fetcher_yields_failure() {
		let token = StaticTokenFetcher::new("").fetch().await;

		assert!(token.error().is_some());
	}
}
