//! Harvester configuration and seed credential loading.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::ConfigError,
};

const DEFAULT_API_BASE: &str = "https://api.x.com/";
const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.x.com/2/oauth2/token";
const MAX_PAGE_SIZE: u32 = 100;

/// How the aggregator reacts when one requested category fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
	/// Any failing category fails the whole request.
	#[default]
	FailFast,
	/// Successful categories are returned next to an explicit per-category failure list.
	Partial,
}

/// Tunables for the transport, paginator, refresh exchange, and aggregator.
///
/// Every field has a default, so an empty JSON/TOML document deserializes into a usable
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
	/// Base URL of the remote resource API.
	pub api_base: Url,
	/// OAuth 2.0 token endpoint used for refreshes.
	pub token_endpoint: Url,
	/// OAuth 2.0 client identifier; refreshes are disabled without one.
	pub client_id: Option<String>,
	/// Optional confidential client secret; redacted in `Debug` and never serialized.
	#[serde(skip_serializing)]
	pub client_secret: Option<TokenSecret>,
	/// Requested page size before per-endpoint clamping.
	pub page_size: u32,
	/// Delay inserted before every page after the first, in milliseconds.
	pub pacing_ms: u64,
	/// Deadline for a whole aggregate request, in seconds.
	pub request_timeout_secs: Option<u64>,
	/// Timeout for a single HTTP call, in seconds.
	pub http_timeout_secs: u64,
	/// Reaction to a failing category.
	pub failure_policy: FailurePolicy,
}
impl HarvestConfig {
	/// Overrides the resource API base URL.
	pub fn with_api_base(mut self, api_base: Url) -> Self {
		self.api_base = api_base;

		self
	}

	/// Overrides the token endpoint.
	pub fn with_token_endpoint(mut self, token_endpoint: Url) -> Self {
		self.token_endpoint = token_endpoint;

		self
	}

	/// Sets the OAuth 2.0 client credentials.
	pub fn with_client(mut self, client_id: impl Into<String>, secret: Option<String>) -> Self {
		self.client_id = Some(client_id.into());
		self.client_secret = secret.map(TokenSecret::new);

		self
	}

	/// Overrides the requested page size.
	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = page_size;

		self
	}

	/// Overrides the inter-page pacing delay.
	pub fn with_pacing(mut self, pacing: std::time::Duration) -> Self {
		self.pacing_ms = u64::try_from(pacing.as_millis()).unwrap_or(u64::MAX);

		self
	}

	/// Sets (or clears) the aggregate request deadline.
	pub fn with_request_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
		self.request_timeout_secs = timeout.map(|value| value.as_secs().max(1));

		self
	}

	/// Overrides the failure policy.
	pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
		self.failure_policy = policy;

		self
	}

	/// Inter-page pacing delay.
	pub fn pacing(&self) -> std::time::Duration {
		std::time::Duration::from_millis(self.pacing_ms)
	}

	/// Aggregate request deadline, if any.
	pub fn request_timeout(&self) -> Option<std::time::Duration> {
		self.request_timeout_secs.map(std::time::Duration::from_secs)
	}

	/// Per-call HTTP timeout.
	pub fn http_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.http_timeout_secs)
	}

	/// Checks ranges and endpoint schemes.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
			return Err(ConfigError::PageSizeOutOfRange {
				value: self.page_size,
				max: MAX_PAGE_SIZE,
			});
		}
		if self.http_timeout_secs == 0 {
			return Err(ConfigError::ZeroTimeout { field: "http" });
		}
		if self.request_timeout_secs == Some(0) {
			return Err(ConfigError::ZeroTimeout { field: "request" });
		}

		ensure_secure("api_base", &self.api_base)?;
		ensure_secure("token_endpoint", &self.token_endpoint)?;

		Ok(())
	}
}
impl Default for HarvestConfig {
	fn default() -> Self {
		Self {
			api_base: Url::parse(DEFAULT_API_BASE).expect("Default API base must parse."),
			token_endpoint: Url::parse(DEFAULT_TOKEN_ENDPOINT)
				.expect("Default token endpoint must parse."),
			client_id: None,
			client_secret: None,
			page_size: MAX_PAGE_SIZE,
			pacing_ms: 1_000,
			request_timeout_secs: None,
			http_timeout_secs: 10,
			failure_policy: FailurePolicy::FailFast,
		}
	}
}

/// Seed bearer credential read from the process environment.
#[derive(Clone, Debug)]
pub struct CredentialSeed;
impl CredentialSeed {
	/// Variable holding the bearer token.
	pub const BEARER_VAR: &'static str = "TWITTER_BEARER";
	/// Variable holding the optional refresh token.
	pub const REFRESH_VAR: &'static str = "TWITTER_REFRESH_TOKEN";

	/// Reads the seed credential from `TWITTER_BEARER` / `TWITTER_REFRESH_TOKEN`.
	pub fn from_env() -> Result<Credential, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the seed credential through an arbitrary variable lookup.
	pub fn from_lookup(
		lookup: impl Fn(&'static str) -> Option<String>,
	) -> Result<Credential, ConfigError> {
		let non_empty = |name| lookup(name).filter(|value: &String| !value.trim().is_empty());
		let bearer =
			non_empty(Self::BEARER_VAR).ok_or(ConfigError::MissingEnv { name: Self::BEARER_VAR })?;
		let credential = Credential::new(bearer.trim());

		Ok(match non_empty(Self::REFRESH_VAR) {
			Some(refresh) => credential.with_refresh_token(refresh.trim()),
			None => credential,
		})
	}
}

fn ensure_secure(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || loopback {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		let config: HarvestConfig =
			serde_json::from_str("{}").expect("Empty config should deserialize.");

		assert_eq!(config, HarvestConfig::default());
		assert_eq!(config.pacing(), std::time::Duration::from_secs(1));
		assert!(config.validate().is_ok());
	}

	#[test]
	fn validation_rejects_bad_values() {
		let config = HarvestConfig::default().with_page_size(0);

		assert!(matches!(config.validate(), Err(ConfigError::PageSizeOutOfRange { .. })));

		let config = HarvestConfig::default().with_api_base(
			Url::parse("http://api.example.com/").expect("Fixture URL should parse."),
		);

		assert!(matches!(
			config.validate(),
			Err(ConfigError::InsecureEndpoint { endpoint: "api_base", .. })
		));

		let config = HarvestConfig::default()
			.with_api_base(Url::parse("http://127.0.0.1:8080/").expect("Fixture URL should parse."));

		assert!(config.validate().is_ok());
	}

	#[test]
	fn client_secret_stays_out_of_dumps() {
		let config: HarvestConfig =
			serde_json::from_str(r#"{"client_id":"harvest","client_secret":"hunter2"}"#)
				.expect("Client config should deserialize.");

		assert_eq!(config.client_secret.as_ref().map(TokenSecret::expose), Some("hunter2"));

		let dumped = serde_json::to_string(&config).expect("Config should serialize.");

		assert!(!dumped.contains("hunter2"));
		assert!(!dumped.contains("client_secret"));
		assert!(!format!("{config:?}").contains("hunter2"));
	}

	#[test]
	fn seed_reads_bearer_and_optional_refresh() {
		let credential = CredentialSeed::from_lookup(|name| match name {
			"TWITTER_BEARER" => Some(" bearer ".into()),
			"TWITTER_REFRESH_TOKEN" => Some(String::new()),
			_ => None,
		})
		.expect("Bearer should be read.");

		assert_eq!(credential.access_token.expose(), "bearer");
		assert!(!credential.can_refresh());

		let err = CredentialSeed::from_lookup(|_| None).expect_err("Missing bearer must fail.");

		assert!(matches!(err, ConfigError::MissingEnv { name: "TWITTER_BEARER" }));
	}
}
