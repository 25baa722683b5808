//! Pipeline-level error types shared across authenticators, interceptors, and transports.

// self
use crate::{_prelude::*, auth::TokenDecodeError};

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; raised at construction time.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token claims could not be decoded into a usable expiry.
	#[error(transparent)]
	Decode(#[from] TokenDecodeError),
	/// Temporary token endpoint failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Remote service answered with a non-success status.
	#[error(transparent)]
	Service(#[from] ServiceError),
	/// The call was cancelled while waiting to resend.
	#[error("Request was cancelled while waiting to retry.")]
	Cancelled,
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Service(e) => Some(e.status),
			Self::Transient(TransientError::TokenEndpoint { status, .. })
			| Self::Transient(TransientError::TokenResponseParse { status, .. }) => *status,
			_ => None,
		}
	}
}

/// Configuration and validation failures; never retried.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The requested authentication type has no registered authenticator.
	#[error("Authentication type `{auth_type}` is not supported.")]
	UnsupportedAuthType {
		/// Raw authentication type as supplied by the caller.
		auth_type: String,
	},
	/// A property required by the selected authenticator is missing or empty.
	#[error("The {auth_type} authenticator requires the `{property}` property.")]
	MissingProperty {
		/// Authenticator discriminator.
		auth_type: &'static str,
		/// Missing property name.
		property: &'static str,
	},
	/// A credential is wrapped in stray quote or brace characters.
	#[error("The `{property}` property must not start or end with '{{', '}}' or '\"'.")]
	BadCredentialFormat {
		/// Offending property name.
		property: &'static str,
	},
	/// Only one half of a client id/secret pair was supplied.
	#[error("Client id and client secret must be supplied together.")]
	IncompleteClientCredentials,
	/// A configured URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Raw URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A computed header value contains illegal characters.
	#[error("Header value is invalid.")]
	InvalidHeaderValue(#[from] oauth2::http::header::InvalidHeaderValue),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned a non-success response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Short summary of the failure, usually a body preview.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport, e.g. while compressing a body.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
	fn from(e: reqwest::Error) -> Self {
		Self::network(e)
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Non-success HTTP status surfaced by [`Response::error_for_status`](crate::http::Response::error_for_status).
#[derive(Debug, ThisError)]
#[error("Service responded with HTTP {status}: {reason}.")]
pub struct ServiceError {
	/// HTTP status code.
	pub status: u16,
	/// Canonical reason phrase, e.g. "Too Many Requests".
	pub reason: String,
	/// Raw response body for caller-side inspection.
	pub body: Bytes,
}
impl ServiceError {
	/// Returns `true` when the service rejected the call with HTTP 429.
	pub fn is_too_many_requests(&self) -> bool {
		self.status == 429
	}
}
