// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	endpoint::{ClientAuth, ResponseFormat, TokenEndpoint},
};

/// Errors raised while constructing or validating endpoint descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenEndpointError {
	/// Token URL must use HTTPS unless it targets a loopback host.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Token URL has no host component.
	#[error("The token endpoint has no host: {url}.")]
	MissingHost {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// JWT responses need a field name.
	#[error("The JWT response field name must not be empty.")]
	EmptyResponseField,
	/// Header names must be visible ASCII without separators.
	#[error("Header name `{name}` is not a valid token.")]
	InvalidHeaderName {
		/// Offending header name.
		name: String,
	},
	/// Basic authentication requires a client identifier.
	#[error("Basic client authentication requires a non-empty client_id.")]
	EmptyClientId,
}

/// Builder for [`TokenEndpoint`] values.
#[derive(Debug)]
pub struct TokenEndpointBuilder {
	/// Token URL.
	pub url: Url,
	/// Client authentication method.
	pub client_auth: ClientAuth,
	/// Form parameters.
	pub form: BTreeMap<String, String>,
	/// Extra request headers.
	pub headers: BTreeMap<String, String>,
	/// Expected response body shape.
	pub response_format: ResponseFormat,
}
impl TokenEndpointBuilder {
	/// Creates a new builder targeting the provided URL.
	pub fn new(url: Url) -> Self {
		Self {
			url,
			client_auth: ClientAuth::default(),
			form: BTreeMap::new(),
			headers: BTreeMap::new(),
			response_format: ResponseFormat::default(),
		}
	}

	/// Adds (or replaces) a form parameter.
	pub fn form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.insert(name.into(), value.into());

		self
	}

	/// Adds multiple form parameters.
	pub fn form_params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		for (name, value) in params {
			self.form.insert(name.into(), value.into());
		}

		self
	}

	/// Authenticates with HTTP Basic.
	pub fn basic_auth(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		self.client_auth =
			ClientAuth::Basic { client_id: client_id.into(), client_secret: client_secret.into() };

		self
	}

	/// Adds (or replaces) an extra request header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Overrides the expected response format.
	pub fn response_format(mut self, format: ResponseFormat) -> Self {
		self.response_format = format;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<TokenEndpoint, TokenEndpointError> {
		let endpoint = TokenEndpoint {
			url: self.url,
			client_auth: self.client_auth,
			form: self.form,
			headers: self.headers,
			response_format: self.response_format,
		};

		endpoint.validate()?;

		Ok(endpoint)
	}
}

impl TokenEndpoint {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), TokenEndpointError> {
		validate_url(&self.url)?;

		if matches!(&self.response_format, ResponseFormat::Jwt { field } if field.trim().is_empty()) {
			return Err(TokenEndpointError::EmptyResponseField);
		}
		if matches!(&self.client_auth, ClientAuth::Basic { client_id, .. } if client_id.is_empty()) {
			return Err(TokenEndpointError::EmptyClientId);
		}

		for name in self.headers.keys() {
			validate_header_name(name)?;
		}

		Ok(())
	}
}

fn validate_url(url: &Url) -> Result<(), TokenEndpointError> {
	let host = url.host().ok_or_else(|| TokenEndpointError::MissingHost { url: url.to_string() })?;

	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(&host) => Ok(()),
		_ => Err(TokenEndpointError::InsecureEndpoint { url: url.to_string() }),
	}
}

fn is_loopback(host: &Host<&str>) -> bool {
	match host {
		Host::Domain(domain) => domain.eq_ignore_ascii_case("localhost"),
		Host::Ipv4(ip) => IpAddr::V4(*ip).is_loopback(),
		Host::Ipv6(ip) => IpAddr::V6(*ip).is_loopback(),
	}
}

// RFC 9110 token characters.
fn validate_header_name(name: &str) -> Result<(), TokenEndpointError> {
	let valid = !name.is_empty()
		&& name.bytes().all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b));

	if valid { Ok(()) } else { Err(TokenEndpointError::InvalidHeaderName { name: name.into() }) }
}
