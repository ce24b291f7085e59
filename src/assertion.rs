//! Signed-assertion construction for the JWT-bearer token exchange.
//!
//! A [`SignedAssertion`] is a short-lived, self-contained signed statement (issuer, audience,
//! issued-at, expiry) derived from the service-account identity at the moment a refresh is
//! needed. It is sent to the exchange endpoint exactly once and discarded; assertions are never
//! cached.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{_prelude::*, auth::ServiceAccountIdentity, error::ConfigError};

/// Claim set carried by a signed assertion, serialized as registered JWT claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issuer: the service-account identifier.
	pub iss: String,
	/// Audience: the fixed token-exchange URI.
	pub aud: String,
	/// Issued-at instant as unix seconds.
	pub iat: i64,
	/// Expiry instant as unix seconds.
	pub exp: i64,
}

/// Compact JWT produced by [`AssertionSigner::sign`]; single-use, redacted in formatters.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedAssertion(String);
impl SignedAssertion {
	/// Returns the compact JWT for the exchange request body.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl From<SignedAssertion> for String {
	fn from(assertion: SignedAssertion) -> Self {
		assertion.0
	}
}
impl Debug for SignedAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SignedAssertion").field(&"<redacted>").finish()
	}
}
impl Display for SignedAssertion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Signs assertions for one service-account identity with RSA-PSS over SHA-256 (PS256).
///
/// The private key PEM is parsed once at construction so malformed key material fails fast
/// instead of on the first refresh.
pub struct AssertionSigner {
	issuer: String,
	header: Header,
	encoding_key: EncodingKey,
}
impl AssertionSigner {
	/// Builds a signer from the provided identity, validating the RSA PEM eagerly.
	pub fn new(identity: &ServiceAccountIdentity) -> Result<Self, ConfigError> {
		let encoding_key = EncodingKey::from_rsa_pem(identity.private_key.expose())
			.map_err(|source| ConfigError::InvalidPrivateKey { source })?;
		let mut header = Header::new(Algorithm::PS256);

		header.kid = Some(identity.key_id.as_ref().to_owned());

		Ok(Self { issuer: identity.account.as_ref().to_owned(), header, encoding_key })
	}

	/// Signs a fresh assertion for `audience`, valid from `issued_at` for `validity`.
	///
	/// For a fixed identity, two assertions signed at different instants differ only in their
	/// `iat`/`exp` claims.
	pub fn sign(
		&self,
		audience: &str,
		issued_at: OffsetDateTime,
		validity: Duration,
	) -> Result<SignedAssertion, ConfigError> {
		let claims = AssertionClaims {
			iss: self.issuer.clone(),
			aud: audience.to_owned(),
			iat: issued_at.unix_timestamp(),
			exp: (issued_at + validity).unix_timestamp(),
		};
		let token = jsonwebtoken::encode(&self.header, &claims, &self.encoding_key)
			.map_err(|source| ConfigError::AssertionSign { source })?;

		Ok(SignedAssertion(token))
	}
}
impl Debug for AssertionSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AssertionSigner")
			.field("issuer", &self.issuer)
			.field("kid", &self.header.kid)
			.finish()
	}
}
