//! Fixed-ticket strategy for callers that manage credentials out of band.

// self
use crate::{
	_prelude::*,
	auth::TicketSecret,
	error::ConfigError,
	metadata::AuthMetadata,
	obs::{self, AuthKind, AuthOutcome},
	strategy::{AuthFuture, AuthStrategy},
};

/// Wraps a caller-supplied fixed bearer ticket.
///
/// Every call resolves immediately with the same attachment; there is no network I/O, no failure
/// path, and no state transition. The async shape exists only for interface symmetry with the
/// refreshing variant.
#[derive(Clone)]
pub struct StaticTicketStrategy {
	ticket: TicketSecret,
}
impl StaticTicketStrategy {
	/// Wraps the provided ticket after rejecting empty values.
	pub fn new(ticket: impl Into<String>) -> Result<Self> {
		let ticket = ticket.into();

		if ticket.is_empty() {
			return Err(ConfigError::EmptyStaticTicket.into());
		}

		Ok(Self { ticket: TicketSecret::new(ticket) })
	}

	/// Returns the wrapped ticket.
	pub fn ticket(&self) -> &TicketSecret {
		&self.ticket
	}
}
impl AuthStrategy for StaticTicketStrategy {
	fn auth_metadata(&self) -> AuthFuture<'_> {
		const KIND: AuthKind = AuthKind::Static;

		Box::pin(async move {
			obs::record_auth_outcome(KIND, AuthOutcome::Attempt);

			let metadata = AuthMetadata::for_ticket(&self.ticket);

			obs::record_auth_outcome(KIND, AuthOutcome::Success);

			Ok(metadata)
		})
	}
}
impl Debug for StaticTicketStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StaticTicketStrategy").field("ticket", &self.ticket).finish()
	}
}
