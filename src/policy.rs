//! Refresh policy knobs for the refreshing strategy.

// self
use crate::{_prelude::*, error::ConfigError};

/// Timing policy applied by the refreshing strategy.
///
/// The staleness threshold is deliberately far shorter than the assertion validity so a ticket is
/// retired well before its remote-side lifetime can expire mid-flight. The exchange response
/// carries no lifetime field, so the margin is local policy rather than something derived from
/// the endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
	/// Validity window minted into every signed assertion.
	pub assertion_validity: Duration,
	/// Elapsed time after which a cached ticket is proactively refreshed.
	pub staleness_threshold: Duration,
	/// Hard deadline for one exchange round-trip.
	pub exchange_timeout: Duration,
}
impl RefreshPolicy {
	/// Default assertion validity window.
	pub const DEFAULT_ASSERTION_VALIDITY: Duration = Duration::seconds(3_600);
	/// Default exchange round-trip deadline.
	pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::seconds(10);
	/// Default staleness threshold.
	pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::seconds(120);

	/// Overrides the assertion validity window.
	pub fn with_assertion_validity(mut self, validity: Duration) -> Self {
		self.assertion_validity = validity;

		self
	}

	/// Overrides the staleness threshold.
	///
	/// A zero threshold makes every call refresh; negative values are rejected by
	/// [`validate`](Self::validate).
	pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
		self.staleness_threshold = threshold;

		self
	}

	/// Overrides the exchange deadline.
	pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
		self.exchange_timeout = timeout;

		self
	}

	/// Checks the policy invariants: positive validity and deadline, non-negative threshold.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.assertion_validity.is_positive() {
			return Err(ConfigError::NonPositiveDuration { field: "assertion_validity" });
		}
		if self.staleness_threshold.is_negative() {
			return Err(ConfigError::NonPositiveDuration { field: "staleness_threshold" });
		}
		if !self.exchange_timeout.is_positive() {
			return Err(ConfigError::NonPositiveDuration { field: "exchange_timeout" });
		}

		Ok(())
	}
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self {
			assertion_validity: Self::DEFAULT_ASSERTION_VALIDITY,
			staleness_threshold: Self::DEFAULT_STALENESS_THRESHOLD,
			exchange_timeout: Self::DEFAULT_EXCHANGE_TIMEOUT,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_policy() {
		let policy = RefreshPolicy::default();

		assert_eq!(policy.assertion_validity, Duration::seconds(3_600));
		assert_eq!(policy.staleness_threshold, Duration::seconds(120));
		assert_eq!(policy.exchange_timeout, Duration::seconds(10));
		policy.validate().expect("Default policy should validate.");
	}

	#[test]
	fn zero_staleness_threshold_is_allowed() {
		let policy = RefreshPolicy::default().with_staleness_threshold(Duration::ZERO);

		policy.validate().expect("Zero staleness threshold should validate.");
	}

	#[test]
	fn non_positive_durations_are_rejected() {
		assert!(
			RefreshPolicy::default().with_assertion_validity(Duration::ZERO).validate().is_err()
		);
		assert!(
			RefreshPolicy::default()
				.with_staleness_threshold(Duration::seconds(-1))
				.validate()
				.is_err()
		);
		assert!(
			RefreshPolicy::default()
				.with_exchange_timeout(Duration::seconds(-10))
				.validate()
				.is_err()
		);
	}
}
