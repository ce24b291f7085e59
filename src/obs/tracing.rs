// self
use crate::{_prelude::*, obs::AuthKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAuth<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAuth<F> = F;

/// A span builder used by auth strategies.
#[derive(Clone, Debug)]
pub struct AuthSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AuthSpan {
	/// Creates a new span tagged with the provided auth kind + stage.
	pub fn new(kind: AuthKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("iam_ticket_broker.auth", auth = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAuth<Fut>
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

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn auth_span_constructs_without_tracing() {
		let _span = AuthSpan::new(AuthKind::Static, "test");
		// Compile-time smoke test ensures the span exists even when tracing is disabled.
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = AuthSpan::new(AuthKind::IamRefresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
