//! Token-service endpoint descriptor shared by HTTP-backed fetchers.
//!
//! The descriptor is transport-agnostic: it records where to POST, how the client
//! authenticates, which form parameters and headers to send, and how to read the response.

/// Builder API for assembling endpoint descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Client authentication applied to token-service requests.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum ClientAuth {
	/// No client authentication; credentials travel in the form body, if at all.
	#[default]
	None,
	/// HTTP Basic with `client_id`/`client_secret`.
	Basic {
		/// Client identifier (Basic username).
		client_id: String,
		/// Client secret (Basic password).
		client_secret: String,
	},
}
impl Debug for ClientAuth {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::None => f.write_str("None"),
			Self::Basic { client_id, .. } => f
				.debug_struct("Basic")
				.field("client_id", client_id)
				.field("client_secret", &"<redacted>")
				.finish(),
		}
	}
}

/// Shape of a successful token-service response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResponseFormat {
	/// JSON carrying `access_token`, `expires_in`, and an optional absolute `expiration`.
	#[default]
	ServerTtl,
	/// JSON object carrying a JWT in the named field.
	Jwt {
		/// Field holding the JWT (`access_token`, `token`, ...).
		field: String,
	},
}
impl ResponseFormat {
	/// Reads a JWT from the provided field.
	pub fn jwt(field: impl Into<String>) -> Self {
		Self::Jwt { field: field.into() }
	}
}

/// Immutable, validated description of a token service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEndpoint {
	/// Token URL; requests are always POSTed.
	pub url: Url,
	/// Client authentication method.
	pub client_auth: ClientAuth,
	/// Form parameters sent as `application/x-www-form-urlencoded`.
	pub form: BTreeMap<String, String>,
	/// Extra request headers.
	pub headers: BTreeMap<String, String>,
	/// Expected response body shape.
	pub response_format: ResponseFormat,
}
impl TokenEndpoint {
	/// Creates a new builder targeting the provided URL.
	pub fn builder(url: Url) -> TokenEndpointBuilder {
		TokenEndpointBuilder::new(url)
	}

	/// Returns `true` when the descriptor authenticates with HTTP Basic.
	pub fn uses_basic_auth(&self) -> bool {
		matches!(self.client_auth, ClientAuth::Basic { .. })
	}
}
