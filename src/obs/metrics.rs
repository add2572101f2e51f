// std
use std::time::Instant;
// self
use crate::obs::{FetchKind, FetchOutcome};

/// Increments `token_lifecycle_fetch_total{kind, outcome}` (when enabled).
pub fn record_fetch_outcome(kind: FetchKind, outcome: FetchOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"token_lifecycle_fetch_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Observes the wall time of a finished fetch in `token_lifecycle_fetch_duration_seconds{kind}`.
pub fn record_fetch_duration(kind: FetchKind, started: Instant) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!("token_lifecycle_fetch_duration_seconds", "kind" => kind.as_str())
			.record(started.elapsed().as_secs_f64());
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, started);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_accept_every_kind() {
		for kind in [FetchKind::Synchronous, FetchKind::Background] {
			record_fetch_outcome(kind, FetchOutcome::Attempt);
			record_fetch_duration(kind, Instant::now());
		}
	}
}
