//! Error taxonomy shared by the transport, paginator, refresh wrapper, and aggregator.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical failure surfaced by a page fetch, a drain, or a credential refresh.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The remote API rejected the bearer credential (invalid or expired).
	#[error("Remote API rejected the bearer credential.")]
	Unauthenticated,
	/// No refresh token is held, or the authorization exchange failed.
	#[error("No usable credential is available: {reason}.")]
	CredentialUnavailable {
		/// Exchange- or holder-supplied reason string.
		reason: String,
	},
	/// The remote API reported request-quota exhaustion.
	#[error("Remote API quota is exhausted; try again later.")]
	RateLimited {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Network or upstream availability failure.
	#[error(transparent)]
	Unavailable(#[from] TransportError),
	/// The remote API answered with a shape the client cannot interpret.
	#[error(transparent)]
	Malformed(#[from] MalformedError),
	/// Local configuration or inbound selector problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns the copyable classification of this error.
	pub fn kind(&self) -> FailureKind {
		match self {
			Self::Unauthenticated => FailureKind::Unauthenticated,
			Self::CredentialUnavailable { .. } => FailureKind::CredentialUnavailable,
			Self::RateLimited { .. } => FailureKind::RateLimited,
			Self::Unavailable(_) => FailureKind::Unavailable,
			Self::Malformed(_) => FailureKind::Malformed,
			Self::Config(_) => FailureKind::Config,
		}
	}

	/// Builds a [`Error::CredentialUnavailable`] from any displayable reason.
	pub fn credential_unavailable(reason: impl Display) -> Self {
		Self::CredentialUnavailable { reason: reason.to_string() }
	}
}

/// Stable, copyable classification of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// See [`Error::Unauthenticated`].
	Unauthenticated,
	/// See [`Error::CredentialUnavailable`].
	CredentialUnavailable,
	/// See [`Error::RateLimited`].
	RateLimited,
	/// See [`Error::Unavailable`].
	Unavailable,
	/// See [`Error::Malformed`].
	Malformed,
	/// See [`Error::Config`].
	Config,
	/// The aggregate request exceeded its deadline.
	TimedOut,
}
impl FailureKind {
	/// Returns a stable label suitable for logs and response bodies.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unauthenticated => "unauthenticated",
			Self::CredentialUnavailable => "credential_unavailable",
			Self::RateLimited => "rate_limited",
			Self::Unavailable => "unavailable",
			Self::Malformed => "malformed",
			Self::Config => "config",
			Self::TimedOut => "timed_out",
		}
	}

	/// Suggested HTTP status for surfacing the failure to an inbound caller.
	pub const fn status_code(self) -> u16 {
		match self {
			Self::RateLimited => 429,
			Self::CredentialUnavailable => 503,
			Self::Config => 400,
			Self::TimedOut => 504,
			Self::Unauthenticated | Self::Unavailable | Self::Malformed => 502,
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-level failures (network, TLS, unexpected upstream status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Upstream answered with a status that is neither success nor a known condition.
	#[error("Remote API answered with HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Short preview of the response body.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response-shape failures.
#[derive(Debug, ThisError)]
pub enum MalformedError {
	/// Response body could not be parsed into the expected page shape.
	#[error("Remote API returned malformed JSON.")]
	Json {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Successful status, but the body only carried API problems.
	#[error("Remote API reported a problem: {detail}.")]
	Problem {
		/// Problem title/detail joined for display.
		detail: String,
	},
	/// A page returned a cursor the drain had already followed.
	#[error("Remote API returned the already followed cursor `{cursor}`.")]
	CursorStalled {
		/// The repeated cursor.
		cursor: String,
	},
	/// Timestamp field did not follow RFC 3339.
	#[error("Remote API returned an invalid timestamp `{value}`.")]
	Timestamp {
		/// Raw timestamp value.
		value: String,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed or joined.
	#[error("Configured URL is invalid.")]
	InvalidUrl(#[from] url::ParseError),
	/// A configured endpoint uses plain HTTP outside of loopback.
	#[error("Endpoint `{endpoint}` must use https.")]
	InsecureEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Page size outside of what the remote API accepts.
	#[error("Page size {value} is outside of 1..={max}.")]
	PageSizeOutOfRange {
		/// Configured value.
		value: u32,
		/// Maximum permitted value.
		max: u32,
	},
	/// A timeout was configured as zero.
	#[error("The {field} timeout must be positive.")]
	ZeroTimeout {
		/// Field label.
		field: &'static str,
	},
	/// A required environment variable is absent or empty.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Post or conversation identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Inbound category or projection selector failed to parse.
	#[error(transparent)]
	InvalidSelector(#[from] crate::model::SelectorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
