//! Expiry policies that turn server-supplied lifetimes into validity and refresh instants.

// self
use crate::_prelude::*;

// A refresh becomes due once 4/5 of the lifetime has elapsed.
const ELAPSED_NUMERATOR: i32 = 4;
const ELAPSED_DENOMINATOR: i32 = 5;

/// Lifetime policy selected by the API that produced a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpiryPolicy {
	/// Server returned `expires_in` alongside an absolute `expiration`.
	ServerTtl {
		/// Lifetime reported by the server.
		expires_in: Duration,
		/// Absolute expiry reported by the server.
		expiration: OffsetDateTime,
	},
	/// Lifetime read from the token's own `iat`/`exp` claims.
	JwtClaims {
		/// `iat` claim.
		issued_at: OffsetDateTime,
		/// `exp` claim.
		expires_at: OffsetDateTime,
	},
	/// Caller-supplied static token.
	NonExpiring,
}
impl ExpiryPolicy {
	/// Absolute expiry, or `None` for tokens that never expire.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		match *self {
			Self::ServerTtl { expiration, .. } => Some(expiration),
			Self::JwtClaims { expires_at, .. } => Some(expires_at),
			Self::NonExpiring => None,
		}
	}

	/// Instant after which a refresh should start; never later than [`Self::expires_at`].
	pub fn refresh_at(&self) -> Option<OffsetDateTime> {
		let refresh_at = match *self {
			Self::ServerTtl { expires_in, expiration } =>
				expiration.saturating_sub(expires_in - elapsed_share(expires_in)),
			Self::JwtClaims { issued_at, expires_at } =>
				issued_at.saturating_add(elapsed_share(expires_at - issued_at)),
			Self::NonExpiring => return None,
		};

		Some(self.expires_at().map_or(refresh_at, |expires_at| refresh_at.min(expires_at)))
	}
}

fn elapsed_share(lifetime: Duration) -> Duration {
	lifetime
		.checked_mul(ELAPSED_NUMERATOR)
		.map_or(lifetime, |scaled| scaled / ELAPSED_DENOMINATOR)
}
