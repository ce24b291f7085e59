//! Ticket secret wrapper and the cached-ticket model tracked by the refreshing strategy.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted bearer-ticket wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TicketSecret(String);
impl TicketSecret {
	/// Wraps a new ticket string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner ticket value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Stable fingerprint for log correlation without leaking the ticket.
	///
	/// Base64 (no padding) encoding of the SHA-256 digest of the ticket value.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		hasher.update(self.0.as_bytes());

		let digest = hasher.finalize();

		STANDARD_NO_PAD.encode(digest)
	}
}
impl AsRef<str> for TicketSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TicketSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TicketSecret").field(&"<redacted>").finish()
	}
}
impl Display for TicketSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Ticket issued by the exchange endpoint paired with its issuance instant.
///
/// The secret and the issued-at instant are always replaced together; no caller ever observes one
/// without the matching other. Replacement is whole-value, there is no history retention.
#[derive(Clone, Debug)]
pub struct CachedTicket {
	/// Bearer ticket attached to outbound calls.
	pub secret: TicketSecret,
	/// Instant the ticket was installed after a successful exchange.
	pub issued_at: OffsetDateTime,
}
impl CachedTicket {
	/// Pairs a freshly exchanged ticket with its issuance instant.
	pub fn new(secret: TicketSecret, issued_at: OffsetDateTime) -> Self {
		Self { secret, issued_at }
	}

	/// Returns `true` once the elapsed time since issuance reaches the staleness threshold.
	pub fn is_stale_at(&self, instant: OffsetDateTime, threshold: Duration) -> bool {
		instant - self.issued_at >= threshold
	}

	/// Convenience helper that checks staleness against the current UTC instant.
	pub fn is_stale(&self, threshold: Duration) -> bool {
		self.is_stale_at(OffsetDateTime::now_utc(), threshold)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TicketSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TicketSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn fingerprint_is_stable_and_opaque() {
		let a = TicketSecret::new("ticket-a");
		let b = TicketSecret::new("ticket-a");
		let c = TicketSecret::new("ticket-c");

		assert_eq!(a.fingerprint(), b.fingerprint());
		assert_ne!(a.fingerprint(), c.fingerprint());
		assert!(!a.fingerprint().contains("ticket-a"));
	}

	#[test]
	fn staleness_threshold_is_inclusive() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let ticket = CachedTicket::new(TicketSecret::new("ticket"), issued);
		let threshold = Duration::seconds(120);

		assert!(!ticket.is_stale_at(issued, threshold));
		assert!(!ticket.is_stale_at(issued + Duration::seconds(119), threshold));
		assert!(ticket.is_stale_at(issued + Duration::seconds(120), threshold));
		assert!(ticket.is_stale_at(issued + Duration::hours(2), threshold));
	}
}
