//! Per-call credential attachment consumed by the surrounding driver.

// self
use crate::{_prelude::*, auth::TicketSecret};

/// Header key carrying the bearer ticket on every outbound call.
pub const AUTH_TICKET_HEADER: &str = "x-ydb-auth-ticket";

/// Key-value attachment applied to one outbound call at the transport layer.
///
/// This is the sole artifact the surrounding driver consumes from the broker. The ticket value is
/// carried in the clear for the transport to attach; formatters still redact it so metadata can
/// be logged safely.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthMetadata(BTreeMap<String, String>);
impl AuthMetadata {
	/// Builds metadata carrying the provided ticket under [`AUTH_TICKET_HEADER`].
	pub fn for_ticket(ticket: &TicketSecret) -> Self {
		let mut entries = BTreeMap::new();

		entries.insert(AUTH_TICKET_HEADER.to_owned(), ticket.expose().to_owned());

		Self(entries)
	}

	/// Returns the attached ticket value, if present.
	pub fn ticket(&self) -> Option<&str> {
		self.0.get(AUTH_TICKET_HEADER).map(String::as_str)
	}

	/// Inserts an additional attachment entry.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), value.into());
	}

	/// Iterates the attachment entries in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Returns the number of attachment entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no entries are attached.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for AuthMetadata {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (key, value) in &self.0 {
			if key == AUTH_TICKET_HEADER {
				map.entry(key, &"<redacted>");
			} else {
				map.entry(key, value);
			}
		}

		map.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn ticket_lands_under_fixed_header() {
		let metadata = AuthMetadata::for_ticket(&TicketSecret::new("abc123"));

		assert_eq!(metadata.ticket(), Some("abc123"));
		assert_eq!(metadata.len(), 1);
		assert_eq!(
			metadata.iter().collect::<Vec<_>>(),
			vec![(AUTH_TICKET_HEADER, "abc123")]
		);
	}

	#[test]
	fn debug_redacts_the_ticket_entry() {
		let mut metadata = AuthMetadata::for_ticket(&TicketSecret::new("abc123"));

		metadata.insert("x-request-id", "req-1");

		let rendered = format!("{metadata:?}");

		assert!(rendered.contains("<redacted>"));
		assert!(rendered.contains("req-1"));
		assert!(!rendered.contains("abc123"));
	}
}
