//! Bearer secret text shared by every caller served from one token.

// self
use crate::_prelude::*;

/// Bearer token text handed to callers.
///
/// Clones share one allocation, so every caller served from the same [`Token`](crate::Token)
/// holds the same string. Formatting never reveals the value; call [`TokenSecret::expose`] at
/// the point the header is written.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TokenSecret(Arc<str>);
impl TokenSecret {
	/// Wraps token text.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Arc::from(value.into()))
	}

	/// Returns the raw token text.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` if no token text is present.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns `true` if both secrets share the same allocation.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret(<{} bytes redacted>)", self.0.len())
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
