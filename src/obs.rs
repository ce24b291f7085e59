//! Optional observability helpers for auth strategies.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `iam_ticket_broker.auth` with the `auth`
//!   (strategy) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `iam_ticket_broker_auth_total` counter for every
//!   attempt/success/failure, labeled by `auth` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Auth flow kinds observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthKind {
	/// Static fixed-ticket strategy.
	Static,
	/// Refreshing IAM-ticket strategy.
	IamRefresh,
}
impl AuthKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthKind::Static => "static",
			AuthKind::IamRefresh => "iam_refresh",
		}
	}
}
impl Display for AuthKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
	/// Entry to a strategy call.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl AuthOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthOutcome::Attempt => "attempt",
			AuthOutcome::Success => "success",
			AuthOutcome::Failure => "failure",
		}
	}
}
impl Display for AuthOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
