//! Strongly typed identifiers enforced across the broker domain.

// std
use std::{ops::Deref, str::FromStr};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (service account, key).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (service account, key).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (service account, key).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { ServiceAccountId, "Identifier of the service account the broker authenticates as.", "ServiceAccount" }
def_id! { KeyId, "Identifier of the signing key registered for the service account.", "Key" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_reject_whitespace_and_empty() {
		assert!(ServiceAccountId::new(" sa-123").is_err(), "Leading whitespace must be rejected.");
		assert!(ServiceAccountId::new("sa-123 ").is_err(), "Trailing whitespace must be rejected.");
		assert!(ServiceAccountId::new("").is_err());
		assert!(KeyId::new("with space").is_err());

		let account = ServiceAccountId::new("sa-123")
			.expect("Service account fixture should be considered valid.");

		assert_eq!(account.as_ref(), "sa-123");
	}

	#[test]
	fn unicode_whitespace_and_length_limits() {
		let nbsp = format!("sa{}id", '\u{00A0}');

		assert!(ServiceAccountId::new(&nbsp).is_err());

		let exact = "a".repeat(IDENTIFIER_MAX_LEN);

		KeyId::new(&exact).expect("Exact length should succeed.");

		let too_long = "a".repeat(IDENTIFIER_MAX_LEN + 1);

		assert!(KeyId::new(&too_long).is_err());
	}

	#[test]
	fn debug_carries_identifier_kind() {
		let key = KeyId::new("key-7").expect("Key fixture should be valid.");

		assert_eq!(format!("{key:?}"), "Key(key-7)");
		assert_eq!(key.to_string(), "key-7");
	}
}
