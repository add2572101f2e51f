//! Request signing contracts that attach cached bearer tokens to outbound requests.

// crates.io
#[cfg(feature = "reqwest")]
use reqwest::{
	RequestBuilder,
	header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
// self
use crate::{_prelude::*, cache::TokenCache, fetch::TokenFetcher, token::TokenSecret};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Formats the `Authorization` header value for a bearer token.
pub fn bearer_header(secret: &TokenSecret) -> String {
	format!("Bearer {}", secret.expose())
}

/// Describes how to attach a [`TokenSecret`] to an outbound request without constraining the
/// HTTP client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects the bearer token.
	fn attach_token(&self, request: Request, secret: &TokenSecret) -> Result<Request, Error>;
}

/// Signs reqwest requests and header maps with `Authorization: Bearer <token>`.
#[cfg(feature = "reqwest")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
#[cfg(feature = "reqwest")]
impl BearerSigner {
	fn header_value(secret: &TokenSecret) -> Result<HeaderValue> {
		let mut value = HeaderValue::from_str(&bearer_header(secret))
			.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.as_str().into() })?;

		value.set_sensitive(true);

		Ok(value)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<RequestBuilder, Error> for BearerSigner {
	fn attach_token(
		&self,
		request: RequestBuilder,
		secret: &TokenSecret,
	) -> Result<RequestBuilder> {
		Ok(request.header(AUTHORIZATION, Self::header_value(secret)?))
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<HeaderMap, Error> for BearerSigner {
	fn attach_token(&self, mut request: HeaderMap, secret: &TokenSecret) -> Result<HeaderMap> {
		request.insert(AUTHORIZATION, Self::header_value(secret)?);

		Ok(request)
	}
}

impl<F> TokenCache<F>
where
	F: ?Sized + TokenFetcher,
{
	/// Obtains a token and hands it to `signer`; on failure the request is dropped unsigned.
	pub async fn authorize<Request, E, S>(&self, request: Request, signer: &S) -> Result<Request, E>
	where
		S: RequestSignerExt<Request, E>,
		E: From<Error>,
	{
		let secret = self.get_token().await?;

		signer.attach_token(request, &secret)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::fetch::StaticTokenFetcher;

	#[test]
	fn bearer_header_uses_scheme_prefix() {
		assert_eq!(bearer_header(&TokenSecret::new("abc")), "Bearer abc");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn header_map_signing_marks_value_sensitive() {
		let headers = BearerSigner
			.attach_token(HeaderMap::new(), &TokenSecret::new("abc"))
			.expect("Plain tokens should sign.");
		let value = headers.get(AUTHORIZATION).expect("Authorization header should be set.");

		assert_eq!(value.to_str().expect("Header should be ASCII."), "Bearer abc");
		assert!(value.is_sensitive());
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn control_characters_are_rejected() {
		let err = BearerSigner
			.attach_token(HeaderMap::new(), &TokenSecret::new("abc\r\nX-Injected: 1"))
			.expect_err("Header injection should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeader { .. })));
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn cache_authorizes_reqwest_builders() {
		let cache = <TokenCache<StaticTokenFetcher>>::new(StaticTokenFetcher::new("static-token"));
		let request = cache
			.authorize(ReqwestClient::new().get("https://api.example/v1/things"), &BearerSigner)
			.await
			.expect("Static token should authorize.")
			.build()
			.expect("Request should build.");

		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok()),
			Some("Bearer static-token")
		);
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn failed_token_leaves_request_unsigned() {
		let cache = <TokenCache<StaticTokenFetcher>>::new(StaticTokenFetcher::new(""));
		let err = cache
			.authorize(HeaderMap::new(), &BearerSigner)
			.await
			.expect_err("Empty static token should fail.");

		assert!(matches!(err, Error::Authentication { .. }));
	}
}
