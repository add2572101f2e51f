//! Demonstrates an IAM-style API-key exchange behind the token cache, then signs an outbound
//! request with the cached bearer token.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use token_lifecycle::{
	TokenCache,
	endpoint::{ResponseFormat, TokenEndpoint},
	http::{HttpTokenFetcher, ReqwestHttpClient},
	reqwest::{Client, header::AUTHORIZATION, redirect::Policy},
	sign::BearerSigner,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/identity/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let endpoint = TokenEndpoint::builder(Url::parse(&server.url("/identity/token"))?)
		.form_param("grant_type", "urn:ibm:params:oauth:grant-type:apikey")
		.form_param("apikey", "demo-apikey")
		.basic_auth("bx", "bx")
		.response_format(ResponseFormat::ServerTtl)
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder().redirect(Policy::none()).build()?,
	);
	let cache = <TokenCache<HttpTokenFetcher>>::new(HttpTokenFetcher::with_http_client(
		endpoint,
		http_client.clone(),
	));
	let request = cache
		.authorize(http_client.get(server.url("/v1/resources")), &BearerSigner)
		.await?
		.build()?;

	println!("Signed request carries: {:?}.", request.headers().get(AUTHORIZATION));

	if let Some(token) = cache.current() {
		println!(
			"Token expires at {:?}; refresh begins at {:?}.",
			token.expires_at(),
			token.refresh_at()
		);
	}

	cache.get_token().await?;

	token_mock.assert_calls_async(1).await;

	println!("Cache metrics: {:?}.", cache.metrics());

	Ok(())
}
