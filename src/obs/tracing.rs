// self
use crate::{_prelude::*, obs::FetchKind};

/// Fetch future wrapped in its span (tracing enabled).
#[cfg(feature = "tracing")]
pub type InstrumentedFetch<F> = tracing::instrument::Instrumented<F>;
/// Fetch future unchanged (tracing disabled).
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFetch<F> = F;

/// Span carried by one fetch, synchronous or background.
#[derive(Clone, Debug)]
pub struct FetchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FetchSpan {
	/// Opens a `token_lifecycle.fetch` span labeled with `kind` and the calling `stage`.
	pub fn new(kind: FetchKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("token_lifecycle.fetch", kind = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Attaches the span to `fut`; detached refresh tasks keep it after the caller returns.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFetch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning for a fetch that produced a failure token.
pub fn record_fetch_failure(kind: FetchKind, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(kind = kind.as_str(), error = %error, "token fetch failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, error);
	}
}

/// Emits a debug event when a due background refresh is not started.
pub fn record_refresh_skipped(reason: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(reason, "background refresh skipped");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}
