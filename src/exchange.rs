//! Token-exchange wire types and transport primitives.
//!
//! The module exposes [`TokenExchangeClient`] so downstream drivers can integrate custom HTTP
//! stacks, alongside [`ExchangeDescriptor`] which pins down the endpoint, audience, and channel
//! security material for the exchange service. The default [`ReqwestExchangeClient`] arms the
//! per-request deadline on the transport itself: when the deadline fires the in-flight future is
//! dropped, so a late-arriving response can never be observed by the broker.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, assertion::SignedAssertion, auth::TicketSecret, error::ConfigError};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Fixed audience URI assertions are minted for when the descriptor does not override it.
pub const DEFAULT_AUDIENCE: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";

/// Boxed future returned by [`TokenExchangeClient::exchange`].
pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<ExchangeResponse>> + 'a + Send>>;

/// Request body posted to the exchange endpoint.
#[derive(Clone, Serialize)]
pub struct ExchangeRequest {
	/// Compact JWT proving the service-account identity.
	#[serde(rename = "signedAssertion")]
	pub signed_assertion: String,
}
impl ExchangeRequest {
	/// Wraps a signed assertion into a request body, consuming the single-use assertion.
	pub fn new(assertion: SignedAssertion) -> Self {
		Self { signed_assertion: assertion.into() }
	}
}
impl Debug for ExchangeRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeRequest").field("signed_assertion", &"<redacted>").finish()
	}
}

/// Response body returned by the exchange endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExchangeResponse {
	/// Issued bearer ticket, when the exchange succeeded.
	#[serde(default)]
	pub token: Option<String>,
}
impl ExchangeResponse {
	/// Extracts the issued ticket, rejecting absent or empty values.
	pub fn into_ticket(self) -> Result<TicketSecret> {
		match self.token {
			Some(token) if !token.is_empty() => Ok(TicketSecret::new(token)),
			_ => Err(Error::EmptyToken),
		}
	}
}

/// Validated description of the token-exchange service: endpoint, audience, channel security.
#[derive(Clone)]
pub struct ExchangeDescriptor {
	/// Token-exchange endpoint receiving assertion posts.
	pub endpoint: Url,
	/// Audience URI minted into every assertion.
	pub audience: String,
	/// Optional PEM-encoded root CA anchoring the secured channel.
	pub root_ca_pem: Option<Vec<u8>>,
}
impl ExchangeDescriptor {
	/// Returns a builder seeded with the provided endpoint.
	pub fn builder(endpoint: Url) -> ExchangeDescriptorBuilder {
		ExchangeDescriptorBuilder::new(endpoint)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.endpoint.scheme() != "https" {
			return Err(ConfigError::InsecureEndpoint { url: self.endpoint.to_string() });
		}
		if self.audience.trim().is_empty() {
			return Err(ConfigError::EmptyAudience);
		}

		Ok(())
	}
}
impl Debug for ExchangeDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangeDescriptor")
			.field("endpoint", &self.endpoint.as_str())
			.field("audience", &self.audience)
			.field("root_ca_pinned", &self.root_ca_pem.is_some())
			.finish()
	}
}

/// Builder for [`ExchangeDescriptor`] values.
#[derive(Debug)]
pub struct ExchangeDescriptorBuilder {
	endpoint: Url,
	audience: Option<String>,
	root_ca_pem: Option<Vec<u8>>,
}
impl ExchangeDescriptorBuilder {
	fn new(endpoint: Url) -> Self {
		Self { endpoint, audience: None, root_ca_pem: None }
	}

	/// Overrides the assertion audience (defaults to [`DEFAULT_AUDIENCE`]).
	pub fn audience(mut self, audience: impl Into<String>) -> Self {
		self.audience = Some(audience.into());

		self
	}

	/// Anchors the exchange channel to the provided PEM-encoded root CA.
	pub fn root_ca_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
		self.root_ca_pem = Some(pem.into());

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ExchangeDescriptor, ConfigError> {
		let descriptor = ExchangeDescriptor {
			endpoint: self.endpoint,
			audience: self.audience.unwrap_or_else(|| DEFAULT_AUDIENCE.to_owned()),
			root_ca_pem: self.root_ca_pem,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

/// Abstraction over transports capable of executing one token exchange.
///
/// The trait is the broker's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a strategy can be shared across driver tasks, and the returned
/// future must be `Send` for the lifetime of the in-flight exchange. The `deadline` is a hard
/// upper bound on the whole round-trip: implementations fail with [`Error::Timeout`] once it
/// elapses and must make sure the eventual late result is discarded rather than surfaced.
pub trait TokenExchangeClient
where
	Self: 'static + Send + Sync,
{
	/// Posts the exchange request to `endpoint`, racing it against `deadline`.
	fn exchange<'a>(
		&'a self,
		endpoint: &'a Url,
		request: ExchangeRequest,
		deadline: Duration,
	) -> ExchangeFuture<'a>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The exchange endpoint returns results directly, so redirect following stays disabled on any
/// custom client passed in. Deadlines are armed per request; reqwest cancels the in-flight call
/// when the timed-out future is dropped.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestExchangeClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestExchangeClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the descriptor's root CA, when one is pinned.
	pub fn from_descriptor(descriptor: &ExchangeDescriptor) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder();

		if let Some(pem) = descriptor.root_ca_pem.as_deref() {
			let certificate =
				reqwest::Certificate::from_pem(pem).map_err(ConfigError::invalid_root_ca)?;

			builder = builder.add_root_certificate(certificate);
		}

		Ok(Self(builder.build().map_err(ConfigError::from)?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestExchangeClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestExchangeClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl TokenExchangeClient for ReqwestExchangeClient {
	fn exchange<'a>(
		&'a self,
		endpoint: &'a Url,
		request: ExchangeRequest,
		deadline: Duration,
	) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.post(endpoint.clone())
				.json(&request)
				.timeout(deadline.unsigned_abs())
				.send()
				.await
				.map_err(|err| map_reqwest_error(err, deadline))?;
			let status = response.status().as_u16();

			if !response.status().is_success() {
				return Err(TransportError::Status { status }.into());
			}

			let bytes =
				response.bytes().await.map_err(|err| map_reqwest_error(err, deadline))?;
			let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
			let parsed: ExchangeResponse = serde_path_to_error::deserialize(&mut deserializer)
				.map_err(|source| Error::ResponseParse { source, status: Some(status) })?;

			Ok(parsed)
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError, deadline: Duration) -> Error {
	if err.is_timeout() {
		return Error::Timeout { deadline };
	}

	TransportError::network(err).into()
}
