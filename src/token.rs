//! Token values produced by a single fetch: either an issued bearer token with an expiry
//! policy or a captured failure.
//!
//! A [`Token`] is immutable after construction apart from its refresh window, which is computed
//! on first use, frozen, and nudged forward by a guard interval each time
//! [`Token::needs_refresh`] reports `true`. The nudge keeps a burst of callers that cross the
//! window together from each scheduling their own refresh. It is a best-effort heuristic; the
//! cache's fetch guard is what bounds in-flight fetches.

pub mod policy;
pub mod secret;

pub use policy::*;
pub use secret::*;

// self
use crate::{
	_prelude::*,
	error::ConfigError,
	jwt::{self, JwtClaims, JwtError},
};

/// Default interval the refresh window moves forward after it reports a due refresh.
pub const DEFAULT_REFRESH_GUARD: Duration = Duration::seconds(60);

/// Outcome of one fetch attempt.
pub struct Token {
	state: TokenState,
	window: Mutex<RefreshWindow>,
}
impl Token {
	/// Builds a token from a server response carrying `expires_in` and an absolute `expiration`.
	pub fn from_server_ttl(
		access_token: impl Into<String>,
		expires_in: Duration,
		expiration: OffsetDateTime,
	) -> Self {
		Self::issued(
			TokenSecret::new(access_token),
			ExpiryPolicy::ServerTtl { expires_in, expiration },
			None,
		)
	}

	/// Builds a token whose lifetime comes from its own `iat`/`exp` claims.
	///
	/// Fails with [`Error::MalformedToken`] when the string is not a decodable JWT and with
	/// [`Error::MissingClaims`] when either timestamp claim is absent.
	pub fn from_jwt(access_token: impl Into<String>) -> Result<Self> {
		let access_token = access_token.into();
		let decoded = jwt::decode(&access_token)?;
		let issued_at = decoded.claims.issued_at.ok_or(Error::MissingClaims { missing: "iat" })?;
		let expires_at = decoded.claims.expires_at.ok_or(Error::MissingClaims { missing: "exp" })?;
		let policy = ExpiryPolicy::JwtClaims {
			issued_at: claim_instant("iat", issued_at)?,
			expires_at: claim_instant("exp", expires_at)?,
		};

		Ok(Self::issued(TokenSecret::new(access_token), policy, Some(decoded.claims)))
	}

	/// Wraps a caller-supplied static token that never expires.
	///
	/// An empty string produces a failure token, so a non-expiring token is valid exactly
	/// when it carries text.
	pub fn non_expiring(access_token: impl Into<String>) -> Self {
		let secret = TokenSecret::new(access_token);

		if secret.is_empty() {
			return Self::from_error(ConfigError::EmptyToken);
		}

		Self::issued(secret, ExpiryPolicy::NonExpiring, None)
	}

	/// Captures a fetch-time failure; the resulting token is never valid and always due.
	pub fn from_error(error: impl Into<Error>) -> Self {
		Self {
			state: TokenState::Failed(Arc::new(error.into())),
			window: Mutex::new(RefreshWindow::Unset),
		}
	}

	/// Flattens a constructor result, capturing any failure.
	pub fn from_result(result: Result<Self>) -> Self {
		result.unwrap_or_else(Self::from_error)
	}

	fn issued(secret: TokenSecret, policy: ExpiryPolicy, claims: Option<JwtClaims>) -> Self {
		Self {
			state: TokenState::Issued { secret, policy, claims },
			window: Mutex::new(RefreshWindow::Unset),
		}
	}

	/// Returns `true` if the token carries no failure and has not expired at `now`.
	pub fn is_valid(&self, now: OffsetDateTime) -> bool {
		match &self.state {
			TokenState::Issued { policy, .. } =>
				policy.expires_at().is_none_or(|expires_at| now < expires_at),
			TokenState::Failed(_) => false,
		}
	}

	/// Returns `true` if a replacement should be fetched, nudging the window by
	/// [`DEFAULT_REFRESH_GUARD`] when it does.
	pub fn needs_refresh(&self, now: OffsetDateTime) -> bool {
		self.needs_refresh_with_guard(now, DEFAULT_REFRESH_GUARD)
	}

	/// Same as [`Token::needs_refresh`] with a caller-chosen guard interval.
	///
	/// The first evaluation freezes the refresh instant. Whenever `now` is past it, the
	/// instant moves to `min(now + guard, expires_at)` before returning `true`, so evaluations
	/// inside the guard interval report `false`.
	pub fn needs_refresh_with_guard(&self, now: OffsetDateTime, guard: Duration) -> bool {
		let TokenState::Issued { policy, .. } = &self.state else {
			return true;
		};
		let mut window = self.window.lock();
		let Some(refresh_at) = window.resolve(policy) else {
			return false;
		};

		if now <= refresh_at {
			return false;
		}

		let nudged = now.saturating_add(guard.max(Duration::ZERO));

		*window = RefreshWindow::Frozen(
			policy.expires_at().map_or(nudged, |expires_at| nudged.min(expires_at)),
		);

		true
	}

	/// Absolute expiry; `None` for non-expiring tokens and failures.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		match &self.state {
			TokenState::Issued { policy, .. } => policy.expires_at(),
			TokenState::Failed(_) => None,
		}
	}

	/// Current refresh instant, computing and freezing it on first access.
	pub fn refresh_at(&self) -> Option<OffsetDateTime> {
		match &self.state {
			TokenState::Issued { policy, .. } => self.window.lock().resolve(policy),
			TokenState::Failed(_) => None,
		}
	}

	/// Expiry policy of an issued token.
	pub fn policy(&self) -> Option<&ExpiryPolicy> {
		match &self.state {
			TokenState::Issued { policy, .. } => Some(policy),
			TokenState::Failed(_) => None,
		}
	}

	/// Bearer secret of an issued token.
	pub fn secret(&self) -> Option<&TokenSecret> {
		match &self.state {
			TokenState::Issued { secret, .. } => Some(secret),
			TokenState::Failed(_) => None,
		}
	}

	/// Claims decoded from a JWT-backed token.
	pub fn claims(&self) -> Option<&JwtClaims> {
		match &self.state {
			TokenState::Issued { claims, .. } => claims.as_ref(),
			TokenState::Failed(_) => None,
		}
	}

	/// Failure captured by the fetch that produced this token.
	pub fn error(&self) -> Option<&Arc<Error>> {
		match &self.state {
			TokenState::Issued { .. } => None,
			TokenState::Failed(error) => Some(error),
		}
	}

	/// Returns the bearer secret, or [`Error::Authentication`] wrapping the captured failure.
	pub fn access_token(&self) -> Result<TokenSecret> {
		match &self.state {
			TokenState::Issued { secret, .. } => Ok(secret.clone()),
			TokenState::Failed(error) => Err(Error::Authentication { source: error.clone() }),
		}
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.state {
			TokenState::Issued { policy, .. } => f
				.debug_struct("Token")
				.field("access_token", &"<redacted>")
				.field("policy", policy)
				.field("window", &*self.window.lock())
				.finish(),
			TokenState::Failed(error) => f.debug_struct("Token").field("error", error).finish(),
		}
	}
}

enum TokenState {
	Issued { secret: TokenSecret, policy: ExpiryPolicy, claims: Option<JwtClaims> },
	Failed(Arc<Error>),
}

#[derive(Clone, Copy, Debug)]
enum RefreshWindow {
	Unset,
	Frozen(OffsetDateTime),
	Never,
}
impl RefreshWindow {
	fn resolve(&mut self, policy: &ExpiryPolicy) -> Option<OffsetDateTime> {
		match *self {
			Self::Unset => {
				*self = policy.refresh_at().map_or(Self::Never, Self::Frozen);

				self.resolve(policy)
			},
			Self::Frozen(at) => Some(at),
			Self::Never => None,
		}
	}
}

fn claim_instant(claim: &'static str, value: i64) -> Result<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp(value)
		.map_err(|_| JwtError::TimestampOutOfRange { claim, value }.into())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::jwt::encode_unsigned;

	fn at(secs: i64) -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(secs).expect("Fixture timestamp should be in range.")
	}

	fn jwt(iat: i64, exp: i64) -> String {
		encode_unsigned(r#"{"alg":"none"}"#, &format!(r#"{{"iat":{iat},"exp":{exp},"sub":"svc"}}"#))
	}

	#[test]
	fn jwt_token_derives_refresh_window_from_claims() {
		let token = Token::from_jwt(jwt(1000, 2000)).expect("Token with iat/exp should build.");

		assert_eq!(token.expires_at(), Some(at(2000)));
		assert_eq!(token.refresh_at(), Some(at(1800)));
		assert!(token.is_valid(at(1999)));
		assert!(!token.is_valid(at(2000)));
		assert!(!token.needs_refresh(at(1800)));
		assert_eq!(token.claims().and_then(|claims| claims.subject.as_deref()), Some("svc"));
	}

	#[test]
	fn refresh_becomes_due_strictly_after_window() {
		for now in [0, 1000, 1799, 1800] {
			let token = Token::from_jwt(jwt(1000, 2000)).expect("Token should build.");

			assert!(!token.needs_refresh(at(now)), "No refresh expected at {now}.");
		}
		for now in [1801, 1900, 1999] {
			let token = Token::from_jwt(jwt(1000, 2000)).expect("Token should build.");

			assert!(token.needs_refresh(at(now)), "Refresh expected at {now}.");
		}
	}

	#[test]
	fn due_refresh_nudges_window_forward() {
		let token = Token::from_jwt(jwt(1000, 5000)).expect("Token should build.");

		// Window sits at 4200.
		assert!(token.needs_refresh(at(4201)));
		assert_eq!(token.refresh_at(), Some(at(4261)));
		assert!(!token.needs_refresh(at(4230)));
		assert!(!token.needs_refresh(at(4261)));
		assert!(token.needs_refresh(at(4262)));
		assert_eq!(token.refresh_at(), Some(at(4322)));
	}

	#[test]
	fn nudge_never_passes_expiry() {
		let token = Token::from_jwt(jwt(1000, 2000)).expect("Token should build.");

		assert!(token.needs_refresh(at(1990)));
		assert_eq!(token.refresh_at(), token.expires_at());
		assert!(!token.needs_refresh(at(1995)));
	}

	#[test]
	fn custom_guard_is_respected() {
		let token = Token::from_jwt(jwt(1000, 2000)).expect("Token should build.");

		assert!(token.needs_refresh_with_guard(at(1801), Duration::seconds(5)));
		assert_eq!(token.refresh_at(), Some(at(1806)));
		assert!(token.needs_refresh_with_guard(at(1807), Duration::ZERO));
		assert!(token.needs_refresh_with_guard(at(1808), Duration::seconds(-30)));
	}

	#[test]
	fn missing_claims_fail_construction() {
		let no_exp = encode_unsigned(r#"{"alg":"none"}"#, r#"{"iat":1000}"#);
		let no_iat = encode_unsigned(r#"{"alg":"none"}"#, r#"{"exp":2000}"#);

		assert!(matches!(Token::from_jwt(no_exp), Err(Error::MissingClaims { missing: "exp" })));
		assert!(matches!(Token::from_jwt(no_iat), Err(Error::MissingClaims { missing: "iat" })));
		assert!(matches!(Token::from_jwt("opaque-token"), Err(Error::MalformedToken(_))));
	}

	#[test]
	fn out_of_range_claims_are_malformed() {
		let token = encode_unsigned("{}", &format!(r#"{{"iat":0,"exp":{}}}"#, i64::MAX));

		assert!(matches!(
			Token::from_jwt(token),
			Err(Error::MalformedToken(JwtError::TimestampOutOfRange { claim: "exp", .. }))
		));
	}

	#[test]
	fn server_ttl_token_tracks_expiration() {
		let token = Token::from_server_ttl(
			"opaque",
			Duration::hours(1),
			macros::datetime!(2025-01-01 01:00 UTC),
		);

		assert_eq!(token.refresh_at(), Some(macros::datetime!(2025-01-01 00:48 UTC)));
		assert!(!token.needs_refresh(macros::datetime!(2025-01-01 00:47 UTC)));
		assert!(token.needs_refresh(macros::datetime!(2025-01-01 00:49 UTC)));
		assert!(token.is_valid(macros::datetime!(2025-01-01 00:59 UTC)));
		assert!(!token.is_valid(macros::datetime!(2025-01-01 01:00 UTC)));
		assert!(token.claims().is_none());
	}

	#[test]
	fn non_expiring_token_is_always_valid() {
		let token = Token::non_expiring("static");

		for now in [at(0), at(i64::from(i32::MAX)), macros::datetime!(9999-12-31 23:59 UTC)] {
			assert!(token.is_valid(now));
			assert!(!token.needs_refresh(now));
		}

		assert_eq!(token.expires_at(), None);
		assert_eq!(token.refresh_at(), None);
		assert_eq!(token.access_token().expect("Static token should be usable.").expose(), "static");
	}

	#[test]
	fn empty_static_token_is_a_failure() {
		let token = Token::non_expiring("");

		assert!(!token.is_valid(at(0)));
		assert!(matches!(
			token.error().map(|error| &**error),
			Some(Error::Config(ConfigError::EmptyToken))
		));
	}

	#[test]
	fn failure_token_is_invalid_and_due() {
		let token = Token::from_result(Token::from_jwt("garbage"));

		assert!(!token.is_valid(at(0)));
		assert!(token.needs_refresh(at(0)));
		assert!(token.needs_refresh(at(0)));
		assert!(token.secret().is_none());

		let err = token.access_token().expect_err("Failure tokens must not yield a secret.");

		assert!(matches!(err, Error::Authentication { .. }));
	}

	#[test]
	fn debug_output_redacts_secret() {
		let token = Token::non_expiring("very-secret");

		assert!(!format!("{token:?}").contains("very-secret"));
	}
}
