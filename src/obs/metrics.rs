// self
use crate::obs::{AuthKind, AuthOutcome};

/// Records an auth outcome via the global metrics recorder (when enabled).
pub fn record_auth_outcome(kind: AuthKind, outcome: AuthOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"iam_ticket_broker_auth_total",
			"auth" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}
