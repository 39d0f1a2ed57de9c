//! Contract for the authorization collaborator that trades a refresh token for new tokens.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`AuthorizationExchange::exchange`].
pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<ExchangedTokens>> + 'a + Send>>;

/// Trades a refresh token for a new access/refresh pair.
///
/// Implementations report every failure as [`Error::CredentialUnavailable`]; the holder
/// does not retry the exchange on its own.
pub trait AuthorizationExchange
where
	Self: Send + Sync,
{
	/// Performs one `refresh_token` exchange.
	fn exchange<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a>;
}

/// Tokens minted by an [`AuthorizationExchange`].
#[derive(Clone, Debug)]
pub struct ExchangedTokens {
	/// New bearer token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, when the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime reported by the provider.
	pub expires_in: Option<Duration>,
}
impl ExchangedTokens {
	/// Creates a result carrying only an access token.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self { access_token: TokenSecret::new(access_token), refresh_token: None, expires_in: None }
	}

	/// Attaches a rotated refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Attaches the provider-reported lifetime.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_in = Some(expires_in);

		self
	}
}
