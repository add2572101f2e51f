//! Error taxonomy shared by the decoder, token constructors, fetchers, and the cache.

// self
use crate::{_prelude::*, jwt::JwtError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Token-construction and fetch failures never escape a [`TokenFetcher`](crate::TokenFetcher);
/// they are captured inside a failure [`Token`](crate::Token) and only surface to callers as
/// [`Error::Authentication`].
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token string could not be split, decoded, or parsed.
	#[error("Token is malformed.")]
	MalformedToken(
		#[from]
		#[source]
		JwtError,
	),
	/// Token decoded but lacks the claims needed to compute its lifetime.
	#[error("Token must carry iat and exp claims; `{missing}` is absent.")]
	MissingClaims {
		/// Name of the first missing claim.
		missing: &'static str,
	},
	/// Temporary upstream failure; retry on next use.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token service refused the request (bad credentials, unknown client, etc.).
	#[error("Token service rejected the request with status {status}: {reason}.")]
	Rejected {
		/// HTTP status code returned by the token service.
		status: u16,
		/// Bounded preview of the response body.
		reason: String,
	},
	/// Opaque failure reported by a custom fetcher.
	#[error("Token fetch failed.")]
	Fetch {
		/// Fetcher-specific failure.
		#[source]
		source: BoxError,
	},
	/// Surfaced to `get_token` callers when the current token carries a failure.
	#[error("Authentication failed: {source}")]
	Authentication {
		/// Failure captured by the fetch that produced the token.
		#[source]
		source: Arc<Error>,
	},
}
impl Error {
	/// Wraps an arbitrary fetcher failure.
	pub fn fetch(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Fetch { source: Box::new(src) }
	}

	/// Returns `true` for failures that are worth retrying on the next use.
	pub fn is_transient(&self) -> bool {
		match self {
			Self::Transient(_) | Self::Transport(_) | Self::Fetch { .. } => true,
			Self::Authentication { source } => source.is_transient(),
			_ => false,
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A static token was constructed from an empty string.
	#[error("Static token must not be empty.")]
	EmptyToken,
	/// Token service response omitted `expires_in`.
	#[error("Token service response is missing expires_in.")]
	MissingExpiresIn,
	/// Token service returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token service returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// A header name or value could not be encoded.
	#[error("Header `{name}` cannot be encoded.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token service returned an unexpected but non-fatal response.
	#[error("Token service returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token service responded with JSON that could not be parsed.
	#[error("Token service returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token service response lacked the field carrying the token.
	#[error("Token service response is missing the `{field}` field.")]
	MissingField {
		/// Field that was expected.
		field: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn authentication_error_exposes_original_cause() {
		let cause = Arc::new(Error::MissingClaims { missing: "exp" });
		let err = Error::Authentication { source: cause.clone() };
		let source = StdError::source(&err).expect("Authentication errors should carry a source.");

		assert_eq!(source.to_string(), cause.to_string());
		assert!(err.to_string().contains("`exp` is absent"));
	}

	#[test]
	fn transient_classification_follows_wrapped_cause() {
		let transient = Error::from(TransientError::TokenEndpoint {
			message: "busy".into(),
			status: Some(503),
			retry_after: None,
		});

		assert!(transient.is_transient());
		assert!(Error::Authentication { source: Arc::new(transient) }.is_transient());
		assert!(!Error::from(ConfigError::EmptyToken).is_transient());
		assert!(!Error::Rejected { status: 401, reason: "nope".into() }.is_transient());
	}
}
