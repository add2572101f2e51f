//! Reqwest-backed fetcher for token services described by a [`TokenEndpoint`].
//!
//! [`HttpTokenFetcher`] POSTs the configured form, classifies the response, and turns every
//! outcome into a [`Token`]. It never fails past the [`TokenFetcher`] boundary.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	StatusCode,
	header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	endpoint::{ClientAuth, ResponseFormat, TokenEndpoint},
	error::{ConfigError, TransientError, TransportError},
	fetch::{FetchFuture, TokenFetcher},
	token::Token,
};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token endpoints answer directly; configure any custom [`ReqwestClient`] not to follow
/// redirects.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Fetches tokens from an HTTP token service.
#[derive(Clone, Debug)]
pub struct HttpTokenFetcher {
	endpoint: TokenEndpoint,
	http_client: ReqwestHttpClient,
}
impl HttpTokenFetcher {
	/// Creates a fetcher backed by a default reqwest client.
	pub fn new(endpoint: TokenEndpoint) -> Self {
		Self::with_http_client(endpoint, ReqwestHttpClient::default())
	}

	/// Creates a fetcher backed by the provided client.
	pub fn with_http_client(endpoint: TokenEndpoint, http_client: ReqwestHttpClient) -> Self {
		Self { endpoint, http_client }
	}

	/// Returns the endpoint descriptor.
	pub fn endpoint(&self) -> &TokenEndpoint {
		&self.endpoint
	}

	/// Performs one token request and classifies the response.
	///
	/// HTTP 429 and 5xx responses become [`TransientError::TokenEndpoint`]; other non-2xx
	/// statuses become [`Error::Rejected`]; connection failures become [`TransportError`].
	pub async fn request_token(&self) -> Result<Token> {
		let mut request = self
			.http_client
			.post(self.endpoint.url.clone())
			.headers(build_headers(&self.endpoint.headers)?)
			.form(&self.endpoint.form);

		if let ClientAuth::Basic { client_id, client_secret } = &self.endpoint.client_auth {
			request = request.basic_auth(client_id, Some(client_secret));
		}

		let response = request.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let retry_after = parse_retry_after(response.headers());
		let body = response.bytes().await.map_err(TransportError::from)?;

		if status.is_success() {
			parse_token_response(
				&self.endpoint.response_format,
				&body,
				status.as_u16(),
				OffsetDateTime::now_utc(),
			)
		} else {
			Err(map_error_status(status, retry_after, &body))
		}
	}
}
impl TokenFetcher for HttpTokenFetcher {
	fn fetch(&self) -> FetchFuture<'_> {
		Box::pin(async move { Token::from_result(self.request_token().await) })
	}
}

#[derive(Deserialize)]
struct ServerTtlResponse {
	access_token: String,
	expires_in: Option<i64>,
	expiration: Option<i64>,
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
	let mut map = HeaderMap::with_capacity(headers.len());

	for (name, value) in headers {
		let invalid = || ConfigError::InvalidHeader { name: name.clone() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		map.insert(header_name, header_value);
	}

	Ok(map)
}

fn parse_token_response(
	format: &ResponseFormat,
	body: &[u8],
	status: u16,
	now: OffsetDateTime,
) -> Result<Token> {
	match format {
		ResponseFormat::ServerTtl => {
			let response: ServerTtlResponse = parse_json(body, status)?;

			if response.access_token.is_empty() {
				return Err(missing_field("access_token", status));
			}

			let expires_in = response.expires_in.ok_or(ConfigError::MissingExpiresIn)?;

			if expires_in <= 0 {
				return Err(ConfigError::NonPositiveExpiresIn.into());
			}

			let expires_in = Duration::seconds(expires_in);
			let expiration = match response.expiration {
				Some(epoch) => OffsetDateTime::from_unix_timestamp(epoch)
					.map_err(|_| ConfigError::ExpiresInOutOfRange)?,
				None => now.checked_add(expires_in).ok_or(ConfigError::ExpiresInOutOfRange)?,
			};

			Ok(Token::from_server_ttl(response.access_token, expires_in, expiration))
		},
		ResponseFormat::Jwt { field } => {
			let object: Map<String, Value> = parse_json(body, status)?;
			let jwt = object
				.get(field)
				.and_then(Value::as_str)
				.filter(|jwt| !jwt.is_empty())
				.ok_or_else(|| missing_field(field, status))?;

			Token::from_jwt(jwt)
		},
	}
}

fn parse_json<T>(body: &[u8], status: u16) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		TransientError::TokenResponseParse { source, status: Some(status) }.into()
	})
}

fn missing_field(field: &str, status: u16) -> Error {
	TransientError::MissingField { field: field.into(), status: Some(status) }.into()
}

fn map_error_status(status: StatusCode, retry_after: Option<Duration>, body: &[u8]) -> Error {
	let preview = body_preview(body)
		.unwrap_or_else(|| status.canonical_reason().unwrap_or("no response body").into());

	if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
		TransientError::TokenEndpoint {
			message: preview,
			status: Some(status.as_u16()),
			retry_after,
		}
		.into()
	} else {
		Error::Rejected { status: status.as_u16(), reason: preview }
	}
}

fn body_preview(body: &[u8]) -> Option<String> {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();

	if text.is_empty() { None } else { Some(text.chars().take(BODY_PREVIEW_LIMIT).collect()) }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
