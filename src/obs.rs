//! Optional observability helpers for token fetches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `token_lifecycle.fetch` with the `kind`
//!   (synchronous or background) and `stage` (call site) fields, plus events for skipped and
//!   failed refreshes.
//! - Enable `metrics` to increment the `token_lifecycle_fetch_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`, and to record fetch wall time in
//!   the `token_lifecycle_fetch_duration_seconds` histogram.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Fetch paths driven by the token cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchKind {
	/// Caller-blocking fetch performed when no usable token exists.
	Synchronous,
	/// Detached refresh started once a valid token crosses its refresh window.
	Background,
}
impl FetchKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchKind::Synchronous => "synchronous",
			FetchKind::Background => "background",
		}
	}
}
impl Display for FetchKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchOutcome {
	/// A fetch was started.
	Attempt,
	/// The fetch produced an issued token.
	Success,
	/// The fetch produced a failure token.
	Failure,
}
impl FetchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FetchOutcome::Attempt => "attempt",
			FetchOutcome::Success => "success",
			FetchOutcome::Failure => "failure",
		}
	}
}
impl Display for FetchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
