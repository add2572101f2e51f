//! Demonstrates a caller-supplied bearer token flowing through the same cache API as fetched
//! tokens.

// crates.io
use color_eyre::Result;
// self
use token_lifecycle::{TokenCache, fetch::StaticTokenFetcher, sign};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cache = <TokenCache<StaticTokenFetcher>>::new(StaticTokenFetcher::new("my-bearer-token"));
	let secret = cache.get_token().await?;

	println!("Authorization: {}.", sign::bearer_header(&secret));
	println!("Debug output stays redacted: {secret:?}.");

	let empty = <TokenCache<StaticTokenFetcher>>::new(StaticTokenFetcher::new(""));

	if let Err(e) = empty.get_token().await {
		println!("Empty static token is rejected: {e}");
	}

	Ok(())
}
