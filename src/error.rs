//! Broker-level error types shared across strategies, assertions, and the exchange transport.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Every refresh failure surfaces unchanged to the caller of
/// [`AuthStrategy::auth_metadata`](crate::strategy::AuthStrategy::auth_metadata); the broker never
/// retries internally and never leaves the ticket cache half-updated. Retry policy belongs to the
/// surrounding driver.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token-exchange round-trip did not complete within the configured deadline.
	#[error("Token exchange timed out after {deadline}.")]
	Timeout {
		/// Deadline that was armed for the exchange request.
		deadline: Duration,
	},
	/// Exchange endpoint responded without a usable ticket.
	#[error("Token exchange response carried no usable ticket.")]
	EmptyToken,
	/// Exchange endpoint responded with malformed JSON that could not be parsed.
	#[error("Token exchange response is malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Configuration and validation failures raised at construction time.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Exchange descriptor endpoint must use HTTPS.
	#[error("The token-exchange endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Exchange descriptor audience was empty.
	#[error("The token-exchange audience cannot be empty.")]
	EmptyAudience,
	/// Root CA material could not be parsed.
	#[error("Root CA certificate is invalid.")]
	InvalidRootCa {
		/// Underlying parsing failure.
		#[source]
		source: BoxError,
	},
	/// Service-account private key could not be parsed as an RSA PEM.
	#[error("Service-account private key is not a valid RSA PEM.")]
	InvalidPrivateKey {
		/// Underlying parsing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Assertion signing failed.
	#[error("Failed to sign the assertion.")]
	AssertionSign {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Identifier validation failed.
	#[error("Invalid identifier supplied.")]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Static ticket value was empty.
	#[error("Static ticket cannot be empty.")]
	EmptyStaticTicket,
	/// Refresh policy contained a non-positive duration.
	#[error("Refresh policy field `{field}` must be positive.")]
	NonPositiveDuration {
		/// Policy field that failed validation.
		field: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a root CA parsing failure inside [`ConfigError`].
	pub fn invalid_root_ca(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::InvalidRootCa { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token-exchange endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Exchange endpoint answered with a non-success HTTP status.
	#[error("Token-exchange endpoint returned HTTP status {status}.")]
	Status {
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token-exchange endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
