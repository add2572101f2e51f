//! Compact JWT claims extraction.
//!
//! [`decode`] splits a compact token on `.`, base64url-decodes the header and claims segments,
//! and parses both as JSON. The signature segment is ignored: this is a claims-extraction
//! helper used to derive token lifetimes, not a validator. Callers that need authenticated
//! claims must verify the signature separately.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Failures raised while decoding a compact JWT.
#[derive(Debug, ThisError)]
pub enum JwtError {
	/// The token did not contain a header and a claims segment.
	#[error("Expected at least 2 dot-separated segments, found {found}.")]
	MissingSegments {
		/// Number of segments present.
		found: usize,
	},
	/// A segment was not valid base64url.
	#[error("The {segment} segment is not valid base64url.")]
	Base64 {
		/// Segment label (`header` or `claims`).
		segment: &'static str,
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// A segment decoded to something other than the expected JSON object.
	#[error("The {segment} segment is not valid JSON.")]
	Json {
		/// Segment label (`header` or `claims`).
		segment: &'static str,
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A NumericDate claim cannot be represented as an instant.
	#[error("The `{claim}` claim value {value} is out of range.")]
	TimestampOutOfRange {
		/// Claim name.
		claim: &'static str,
		/// Raw claim value in seconds since the epoch.
		value: i64,
	},
}

/// Header and claims extracted from a compact JWT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedJwt {
	/// Header parameters; non-string values are kept in their JSON form.
	pub header: BTreeMap<String, String>,
	/// Registered and provider-specific claims carried through by the token core.
	pub claims: JwtClaims,
}

/// Claims the token core reads from a JWT payload.
///
/// Only `iat` and `exp` are interpreted; the remaining claims are carried through for callers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
	/// `iat`: issued-at instant in seconds since the epoch.
	#[serde(rename = "iat", default, deserialize_with = "numeric_date")]
	pub issued_at: Option<i64>,
	/// `exp`: expiry instant in seconds since the epoch.
	#[serde(rename = "exp", default, deserialize_with = "numeric_date")]
	pub expires_at: Option<i64>,
	/// `sub`: subject.
	#[serde(rename = "sub", default)]
	pub subject: Option<String>,
	/// `iss`: issuer.
	#[serde(rename = "iss", default)]
	pub issuer: Option<String>,
	/// `aud`: audiences; a single string is normalized into a one-element list.
	#[serde(rename = "aud", default, deserialize_with = "audience")]
	pub audience: Vec<String>,
	/// `uid`: provider-specific user identifier.
	#[serde(rename = "uid", default)]
	pub user_id: Option<String>,
	/// `username`: provider-specific user name.
	#[serde(default)]
	pub username: Option<String>,
	/// `role`: provider-specific role.
	#[serde(default)]
	pub role: Option<String>,
}

/// Decodes the header and claims of a compact JWT without verifying its signature.
pub fn decode(token: &str) -> Result<DecodedJwt, JwtError> {
	let mut segments = token.split('.');
	let (header, claims) = match (segments.next(), segments.next()) {
		(Some(header), Some(claims)) => (header, claims),
		_ => return Err(JwtError::MissingSegments { found: token.split('.').count() }),
	};
	let header: BTreeMap<String, serde_json::Value> = decode_segment("header", header)?;
	let header = header
		.into_iter()
		.map(|(key, value)| match value {
			serde_json::Value::String(text) => (key, text),
			other => (key, other.to_string()),
		})
		.collect();
	let claims = decode_segment("claims", claims)?;

	Ok(DecodedJwt { header, claims })
}

fn decode_segment<T>(segment: &'static str, raw: &str) -> Result<T, JwtError>
where
	T: DeserializeOwned,
{
	let bytes = URL_SAFE_NO_PAD
		.decode(raw.trim_end_matches('='))
		.map_err(|source| JwtError::Base64 { segment, source })?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut de).map_err(|source| JwtError::Json { segment, source })
}

fn numeric_date<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum NumericDate {
		Whole(i64),
		Fractional(f64),
	}

	Ok(Option::<NumericDate>::deserialize(deserializer)?.map(|value| match value {
		NumericDate::Whole(secs) => secs,
		NumericDate::Fractional(secs) => secs.trunc() as i64,
	}))
}

fn audience<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Audience {
		One(String),
		Many(Vec<String>),
	}

	Ok(match Option::<Audience>::deserialize(deserializer)? {
		Some(Audience::One(value)) => vec![value],
		Some(Audience::Many(values)) => values,
		None => Vec::new(),
	})
}

/// Builds an unsigned compact JWT from raw header and claims JSON.
#[cfg(test)]
pub(crate) fn encode_unsigned(header: &str, claims: &str) -> String {
	format!("{}.{}.", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(claims))
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::URL_SAFE;
	// self
	use super::*;

	#[test]
	fn decodes_header_and_claims() {
		let token = encode_unsigned(
			r#"{"alg":"RS256","typ":"JWT","ver":1}"#,
			r#"{"iat":1000,"exp":2000,"sub":"svc","iss":"https://iam.example.com","aud":"api","uid":"u-1","username":"robot","role":"Admin"}"#,
		);
		let decoded = decode(&token).expect("Well-formed token should decode.");

		assert_eq!(decoded.header.get("alg").map(String::as_str), Some("RS256"));
		assert_eq!(decoded.header.get("ver").map(String::as_str), Some("1"));
		assert_eq!(decoded.claims.issued_at, Some(1000));
		assert_eq!(decoded.claims.expires_at, Some(2000));
		assert_eq!(decoded.claims.subject.as_deref(), Some("svc"));
		assert_eq!(decoded.claims.issuer.as_deref(), Some("https://iam.example.com"));
		assert_eq!(decoded.claims.audience, vec!["api".to_owned()]);
		assert_eq!(decoded.claims.user_id.as_deref(), Some("u-1"));
		assert_eq!(decoded.claims.username.as_deref(), Some("robot"));
		assert_eq!(decoded.claims.role.as_deref(), Some("Admin"));
	}

	#[test]
	fn accepts_fractional_dates_audience_lists_and_padding() {
		let header = URL_SAFE.encode(r#"{"alg":"none"}"#);
		let claims = URL_SAFE.encode(r#"{"iat":1000.9,"exp":2000,"aud":["a","b"]}"#);
		let decoded = decode(&format!("{header}.{claims}")).expect("Padded segments should decode.");

		assert_eq!(decoded.claims.issued_at, Some(1000));
		assert_eq!(decoded.claims.audience, vec!["a".to_owned(), "b".to_owned()]);
	}

	#[test]
	fn missing_claims_decode_as_absent() {
		let decoded = decode(&encode_unsigned(r#"{"alg":"none"}"#, r#"{"sub":"x"}"#))
			.expect("Claims without timestamps should still decode.");

		assert_eq!(decoded.claims.issued_at, None);
		assert_eq!(decoded.claims.expires_at, None);
		assert!(decoded.claims.audience.is_empty());
	}

	#[test]
	fn rejects_malformed_input() {
		assert!(matches!(decode("no-dots-here"), Err(JwtError::MissingSegments { found: 1 })));
		assert!(matches!(decode("!!!.e30"), Err(JwtError::Base64 { segment: "header", .. })));

		let not_json = format!("{}.{}", URL_SAFE_NO_PAD.encode("{}"), URL_SAFE_NO_PAD.encode("nope"));

		assert!(matches!(decode(&not_json), Err(JwtError::Json { segment: "claims", .. })));

		let wrong_type = encode_unsigned("{}", r#"{"exp":"soon"}"#);
		let err = decode(&wrong_type).expect_err("String timestamps should be rejected.");

		assert!(matches!(err, JwtError::Json { segment: "claims", .. }));
	}
}
