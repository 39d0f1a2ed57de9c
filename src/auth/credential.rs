//! Bearer credential snapshot and the redacting secret wrapper it is built from.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping bearer and refresh tokens out of logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Immutable snapshot of the bearer credential held by a [`CredentialHolder`].
///
/// Expiry is unknown up front; a credential is treated as valid until the remote API
/// rejects it. `generation` increases by one on every successful refresh so callers can
/// tell snapshots apart without comparing secrets.
///
/// [`CredentialHolder`]: crate::auth::CredentialHolder
#[derive(Clone)]
pub struct Credential {
	/// Bearer token presented on every remote call.
	pub access_token: TokenSecret,
	/// Refresh token used by the authorization exchange, if one was issued.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the credential was installed in the holder.
	pub issued_at: OffsetDateTime,
	/// Expiry reported by the authorization exchange, when it reports one.
	pub expires_at: Option<OffsetDateTime>,
	/// Monotonic refresh counter; zero for the seed credential.
	pub generation: u64,
}
impl Credential {
	/// Creates a seed credential from a bearer token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
			generation: 0,
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Returns `true` when a refresh token is held.
	pub fn can_refresh(&self) -> bool {
		self.refresh_token.is_some()
	}

	/// Builds the successor credential from an exchange result.
	///
	/// Providers that do not rotate refresh tokens omit one from the response; the
	/// previous refresh token then stays in force.
	pub(crate) fn rotate(&self, tokens: super::ExchangedTokens) -> Self {
		let issued_at = OffsetDateTime::now_utc();

		Self {
			access_token: tokens.access_token,
			refresh_token: tokens.refresh_token.or_else(|| self.refresh_token.clone()),
			issued_at,
			expires_at: tokens.expires_in.map(|ttl| issued_at + ttl),
			generation: self.generation + 1,
		}
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("generation", &self.generation)
			.finish()
	}
}
